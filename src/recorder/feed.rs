//! Chunk feed and retry queue.
//!
//! `feed` drives a chunk through the session's current sink, respawning the
//! transcoder and retrying inline on failure, and parking the chunk in the
//! pending queue when the retries are exhausted — the chunk is never
//! dropped, and the client still gets an acceptance response. `sweep`
//! retries the pending queue in original order; eventual delivery order
//! always equals HTTP-arrival order.

use tracing::{debug, info, warn};

use super::session::{LiveSession, SessionPipe};
use crate::config::RetryConfig;
use crate::models::chunk::Chunk;
use crate::models::session::SessionStatus;
use crate::pipeline::SinkFactory;
use crate::{AppError, Result};

/// How a fed chunk was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Confirmed written to the transcoder pipe.
    Written,
    /// Parked in the pending queue for a later sweep.
    Buffered,
}

/// Feed one chunk into the session's pipe.
///
/// Runs under the session's pipe lock. When older chunks are already
/// pending, a sweep runs first and the new chunk is buffered behind any
/// survivors rather than written past them, preserving arrival order on
/// the pipe. Write failures are absorbed: respawn-and-retry up to
/// `retry.max_immediate_retries` times, then buffer.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the session is no longer `Active`
/// (merge already started or completed). Pipe failures never surface here.
pub async fn feed(
    session: &LiveSession,
    factory: &dyn SinkFactory,
    retry: &RetryConfig,
    chunk: Chunk,
) -> Result<FeedOutcome> {
    let mut pipe = session.pipe.lock().await;

    // Re-check under the lock: a merge may have begun while we waited.
    if session.status() != SessionStatus::Active {
        return Err(AppError::NotFound(format!(
            "session {} is no longer active",
            session.meta.token
        )));
    }

    if !pipe.pending.is_empty() {
        sweep_locked(&mut pipe, session, factory, retry).await;
        if !pipe.pending.is_empty() {
            // Older chunks are still queued; writing this one directly
            // would reorder the stream.
            debug!(
                token = %session.meta.token,
                part = ?chunk.part_hint,
                queued = pipe.pending.len(),
                "buffering chunk behind pending queue"
            );
            pipe.pending.push_back(chunk);
            return Ok(FeedOutcome::Buffered);
        }
    }

    let mut budget = retry.max_immediate_retries;
    match deliver(&mut pipe, session, factory, &mut budget, &chunk).await {
        Ok(()) => Ok(FeedOutcome::Written),
        Err(err) => {
            warn!(
                token = %session.meta.token,
                part = ?chunk.part_hint,
                %err,
                "chunk write failed after retries; parking in pending queue"
            );
            pipe.pending.push_back(chunk);
            Ok(FeedOutcome::Buffered)
        }
    }
}

/// Retry the session's pending queue, in original enqueue order.
///
/// Idempotent; may run after every upload or on a timer. Returns the number
/// of chunks delivered in this pass.
pub async fn sweep(
    session: &LiveSession,
    factory: &dyn SinkFactory,
    retry: &RetryConfig,
) -> usize {
    let mut pipe = session.pipe.lock().await;
    sweep_locked(&mut pipe, session, factory, retry).await
}

/// Sweep with the pipe lock already held.
///
/// Attempts each pending chunk in order; a chunk that succeeds is removed,
/// the first chunk that still fails stops the pass and everything behind it
/// stays queued. The whole pass shares one respawn budget so a dead
/// transcoder costs at most `max_immediate_retries` spawn attempts.
pub(crate) async fn sweep_locked(
    pipe: &mut SessionPipe,
    session: &LiveSession,
    factory: &dyn SinkFactory,
    retry: &RetryConfig,
) -> usize {
    let mut delivered = 0usize;
    let mut budget = retry.max_immediate_retries;

    while let Some(front) = pipe.pending.front() {
        let chunk = front.clone();
        match deliver(pipe, session, factory, &mut budget, &chunk).await {
            Ok(()) => {
                pipe.pending.pop_front();
                delivered += 1;
            }
            Err(err) => {
                debug!(
                    token = %session.meta.token,
                    remaining = pipe.pending.len(),
                    %err,
                    "sweep stopped at first undeliverable chunk"
                );
                break;
            }
        }
    }

    if delivered > 0 {
        info!(
            token = %session.meta.token,
            delivered,
            remaining = pipe.pending.len(),
            "sweep delivered buffered chunks"
        );
    }

    delivered
}

/// One delivery attempt plus respawn-and-retry while `budget` lasts.
///
/// A failed spawn consumes budget just like a failed write: spawn failure
/// manifests to callers as repeated write failures until resolved.
async fn deliver(
    pipe: &mut SessionPipe,
    session: &LiveSession,
    factory: &dyn SinkFactory,
    budget: &mut u32,
    chunk: &Chunk,
) -> Result<()> {
    let mut last_err = match pipe.sink.write(&chunk.payload).await {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    while *budget > 0 {
        *budget -= 1;
        warn!(
            token = %session.meta.token,
            %last_err,
            "pipe write failed; respawning transcoder against same target"
        );

        match factory.spawn(&session.meta.target_path).await {
            Ok(sink) => {
                // The replaced sink is dead or dying; dropping it reaps the
                // old process.
                pipe.sink = sink;
                match pipe.sink.write(&chunk.payload).await {
                    Ok(()) => return Ok(()),
                    Err(err) => last_err = err,
                }
            }
            Err(err) => last_err = err,
        }
    }

    Err(last_err)
}
