//! Session registry: the only process-wide shared mutable state.
//!
//! Maps session tokens to live sessions behind a single mutex, so create,
//! lookup, and remove are mutually exclusive and cannot corrupt the
//! mapping. The lock guards only the map itself — it is never held across
//! an await, and per-session pipe work proceeds fully in parallel across
//! sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::session::LiveSession;
use crate::models::session::{SessionMeta, SessionStatus};
use crate::pipeline::SinkFactory;
use crate::{GlobalConfig, Result};

/// Token → session mapping guarding concurrent create/lookup/remove.
///
/// There is no capacity bound; an unbounded number of concurrent sessions
/// may be created.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<LiveSession>>>,
}

impl SessionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session: derive a fresh output path, spawn a sink against
    /// it, and register the session as `Active` under a newly minted token.
    ///
    /// The token is a v4 UUID, unique for the registry's lifetime. The sink
    /// is spawned before the map lock is taken so a slow process launch
    /// never blocks other sessions' registry operations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Spawn`](crate::AppError::Spawn) if the external
    /// process cannot be started; nothing is registered in that case.
    pub async fn create(
        &self,
        config: &GlobalConfig,
        factory: &dyn SinkFactory,
    ) -> Result<Arc<LiveSession>> {
        let meta = SessionMeta::mint(&config.output_dir, &config.transcoder.input_format);
        let sink = factory.spawn(&meta.target_path).await?;

        let session = Arc::new(LiveSession::new(meta, sink));
        let token = session.meta.token.clone();

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), Arc::clone(&session));

        info!(%token, target = %session.meta.target_path.display(), "session created");
        Ok(session)
    }

    /// Look up a session by token.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<Arc<LiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    /// Remove a session entry, returning it if present.
    #[must_use]
    pub fn remove(&self, token: &str) -> Option<Arc<LiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }

    /// Resolve the single `Active` session, for tokenless merge requests.
    ///
    /// Returns `None` when zero or two-or-more sessions are `Active`. The
    /// answer is a point-in-time snapshot: concurrent creation can change
    /// it before the caller acts, which is inherent to the feature.
    #[must_use]
    pub fn sole_active(&self) -> Option<Arc<LiveSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut active = sessions
            .values()
            .filter(|s| s.status() == SessionStatus::Active);
        let first = active.next()?;
        if active.next().is_some() {
            return None;
        }
        Some(Arc::clone(first))
    }

    /// Take every registered session out of the map, for shutdown draining.
    #[must_use]
    pub fn drain(&self) -> Vec<Arc<LiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, session)| session)
            .collect()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the registry holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
