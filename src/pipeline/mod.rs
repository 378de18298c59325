//! External-process pipe abstraction.
//!
//! The transcoder is modelled as an abstract byte-sink capability —
//! `spawn` / `write` / `close` — so the session registry and the feed queue
//! never touch `tokio::process` directly and can be exercised against fake
//! sinks in tests. The production implementation lives in [`ffmpeg`].

pub mod ffmpeg;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::Result;

/// Boxed future alias used by the capability traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single-writer, no-seek byte sink backed by one external process.
///
/// Ownership is exclusive: a sink belongs to exactly one session and is
/// never shared. Writes are applied under the owning session's pipe lock,
/// so implementations need not be internally synchronised.
pub trait ChunkSink: Send {
    /// Write and flush `bytes` to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipe`](crate::AppError::Pipe) on broken pipe,
    /// closed handle, or OS-level I/O error.
    fn write<'a>(&'a mut self, bytes: &'a [u8]) -> BoxFuture<'a, Result<()>>;

    /// Close the input side of the pipe and block until the process exits.
    ///
    /// The target file is complete on disk only after this returns. The
    /// call is idempotent; closing an already-closed sink is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipe`](crate::AppError::Pipe) if the process
    /// cannot be awaited or exits with a failure status.
    fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Spawns sinks against a target output path.
pub trait SinkFactory: Send + Sync {
    /// Launch a fresh sink process writing to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Spawn`](crate::AppError::Spawn) if the external
    /// process cannot be started.
    fn spawn<'a>(&'a self, target: &'a Path) -> BoxFuture<'a, Result<Box<dyn ChunkSink>>>;
}
