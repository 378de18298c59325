//! Live session state: status, sink, and the pending-chunk queue.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::models::chunk::Chunk;
use crate::models::session::{SessionMeta, SessionStatus};
use crate::pipeline::ChunkSink;

/// Mutable pipe state of one session.
///
/// Guarded by [`LiveSession::pipe`], which is the per-session serialization
/// point: chunk writes, sweeps, and the final close all run under this lock
/// so bytes are never interleaved on the transcoder pipe.
pub struct SessionPipe {
    /// Current sink; replaced in place when the transcoder is respawned.
    pub sink: Box<dyn ChunkSink>,
    /// Chunks accepted from the client but not yet confirmed written, in
    /// arrival order. A chunk leaves this queue only on a successful write.
    pub pending: VecDeque<Chunk>,
}

/// One registered recording session.
pub struct LiveSession {
    /// Immutable identity: token, target path, creation time.
    pub meta: SessionMeta,
    /// Lifecycle status, checked without touching the pipe lock.
    status: Mutex<SessionStatus>,
    /// Sink and pending queue, serialized per session.
    pub pipe: AsyncMutex<SessionPipe>,
}

impl LiveSession {
    /// Wrap a freshly spawned sink into an `Active` session.
    #[must_use]
    pub fn new(meta: SessionMeta, sink: Box<dyn ChunkSink>) -> Self {
        Self {
            meta,
            status: Mutex::new(SessionStatus::Active),
            pipe: AsyncMutex::new(SessionPipe {
                sink,
                pending: VecDeque::new(),
            }),
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempt the `Active` → `Finalizing` transition.
    ///
    /// Returns `false` if the session is not `Active`, which covers both a
    /// concurrent double merge and a merge after close.
    #[must_use]
    pub fn begin_finalizing(&self) -> bool {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if status.can_transition_to(SessionStatus::Finalizing) {
            *status = SessionStatus::Finalizing;
            true
        } else {
            false
        }
    }

    /// Complete the `Finalizing` → `Closed` transition.
    pub fn mark_closed(&self) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if status.can_transition_to(SessionStatus::Closed) {
            *status = SessionStatus::Closed;
        }
    }
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("meta", &self.meta)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
