//! HTTP front end.
//!
//! Stateless dispatch over the shared [`AppState`]: session creation, chunk
//! upload, and merge map directly onto registry/feed/finalizer operations.
//! Every response carries permissive cross-origin headers, and any
//! `OPTIONS` request on any path is short-circuited to an empty 200 with
//! no state change.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pipeline::SinkFactory;
use crate::recorder::registry::SessionRegistry;
use crate::{AppError, GlobalConfig, Result};

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GlobalConfig>,
    /// Token → session registry.
    pub registry: Arc<SessionRegistry>,
    /// Sink factory used for session creation and respawn-on-failure.
    pub factory: Arc<dyn SinkFactory>,
}

/// Build the application router.
///
/// Chunk uploads carry arbitrary-sized bodies, so the default body limit is
/// disabled on this router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/session", get(handlers::create_session))
        .route("/upload", post(handlers::upload))
        .route("/merge", post(handlers::merge))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(cors_and_preflight))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Bind a TCP listener on the configured port.
///
/// # Errors
///
/// Returns `AppError::Config` if the address cannot be bound.
pub async fn bind(config: &GlobalConfig) -> Result<(TcpListener, SocketAddr)> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind on {addr}: {err}")))?;
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Config(format!("failed to read bound address: {err}")))?;
    Ok((listener, local))
}

/// Serve the HTTP front end until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the server loop fails.
pub async fn serve(listener: TcpListener, state: AppState, ct: CancellationToken) -> Result<()> {
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            ct.cancelled().await;
        })
        .await
        .map_err(|err| AppError::Config(format!("http server error: {err}")))?;

    info!("http front end shut down");
    Ok(())
}

/// Apply the permissive cross-origin allow headers to a response.
fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

/// Middleware: answer preflight requests directly and stamp CORS headers on
/// every other response.
async fn cors_and_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        apply_cors(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors(response.headers_mut());
    response
}

/// Extract a query parameter from a URI.
///
/// Returns `None` when the parameter is absent or empty. Values are passed
/// through raw; tokens are UUIDs, so URL decoding is not a concern.
#[must_use]
pub fn extract_param(uri: &Uri, key: &str) -> Option<String> {
    uri.query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_owned())
            .filter(|v| !v.is_empty())
    })
}
