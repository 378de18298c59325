//! Request handlers for the recording API.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, error, info};

use super::{extract_param, AppState};
use crate::models::chunk::Chunk;
use crate::recorder::{feed, finalize};

/// `GET /session` — mint a token and spawn the session's transcoder.
///
/// Responds 200 with the bare token. A transcoder that cannot start fails
/// the request with 500 rather than registering a session whose uploads
/// could never land.
pub async fn create_session(State(state): State<AppState>) -> Response {
    match state
        .registry
        .create(&state.config, state.factory.as_ref())
        .await
    {
        Ok(session) => (StatusCode::OK, session.meta.token.clone()).into_response(),
        Err(err) => {
            error!(%err, "session creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to start transcoder",
            )
                .into_response()
        }
    }
}

/// `POST /upload?session=<token>&part=<n>` — feed one chunk.
///
/// Responds 200 `"ok"` whether the chunk was written immediately or parked
/// in the pending queue; acceptance is not a durability guarantee. Unknown
/// or missing token → 404. The `part` value is a client-side sequence hint,
/// logged for diagnostics and never used to reorder.
pub async fn upload(State(state): State<AppState>, uri: Uri, body: Bytes) -> Response {
    let Some(token) = extract_param(&uri, "session") else {
        return (StatusCode::NOT_FOUND, "missing session parameter").into_response();
    };
    let part_hint = extract_param(&uri, "part").and_then(|p| p.parse::<u64>().ok());

    let Some(session) = state.registry.lookup(&token) else {
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    };

    let chunk = Chunk::new(token.clone(), part_hint, body);
    let size = chunk.len();

    match feed::feed(
        &session,
        state.factory.as_ref(),
        &state.config.retry,
        chunk,
    )
    .await
    {
        Ok(outcome) => {
            debug!(%token, part = ?part_hint, size, ?outcome, "chunk accepted");
            (StatusCode::OK, "ok").into_response()
        }
        Err(err) => {
            debug!(%token, %err, "upload rejected");
            (StatusCode::NOT_FOUND, "session not found").into_response()
        }
    }
}

/// `POST /merge[?session=<token>]` — finalize a session.
///
/// With a token the session is resolved directly; without one the request
/// resolves to the sole `Active` session, and fails with 404 when zero or
/// several are active. Blocks until the transcoder exits.
pub async fn merge(State(state): State<AppState>, uri: Uri) -> Response {
    let session = match extract_param(&uri, "session") {
        Some(token) => state.registry.lookup(&token),
        None => {
            let resolved = state.registry.sole_active();
            if let Some(ref s) = resolved {
                info!(token = %s.meta.token, "tokenless merge resolved to sole active session");
            }
            resolved
        }
    };

    let Some(session) = session else {
        return (StatusCode::NOT_FOUND, "session not found for merge").into_response();
    };

    match finalize::merge(
        &state.registry,
        state.factory.as_ref(),
        &state.config.retry,
        &session,
    )
    .await
    {
        Ok(()) => (StatusCode::OK, "merge done").into_response(),
        Err(err) => {
            debug!(token = %session.meta.token, %err, "merge rejected");
            (StatusCode::NOT_FOUND, "session not found for merge").into_response()
        }
    }
}

/// Fallback for unknown paths and methods.
#[allow(clippy::unused_async)]
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}
