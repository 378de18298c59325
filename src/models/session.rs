//! Session model and lifecycle helpers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status for a recording session.
///
/// A session moves `Active` → `Finalizing` → `Closed` exactly once; there
/// are no backward edges, and a `Closed` session is removed from the
/// registry so the token cannot be resurrected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session accepting chunk uploads.
    Active,
    /// Merge in progress; the pipe is being drained and closed.
    Finalizing,
    /// Output file finished; the session is gone from the registry.
    Closed,
}

impl SessionStatus {
    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Finalizing) | (Self::Finalizing, Self::Closed)
        )
    }
}

/// Immutable identity of a recording session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionMeta {
    /// Opaque unique token handed to the capture client.
    pub token: String,
    /// Path of the finished media file.
    pub target_path: PathBuf,
    /// Creation timestamp; part of the output file name.
    pub created_at: DateTime<Utc>,
}

impl SessionMeta {
    /// Mint a new session identity with a fresh token and a target path
    /// derived deterministically from token, creation time, and format.
    #[must_use]
    pub fn mint(output_dir: &Path, extension: &str) -> Self {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let target_path = output_dir.join(output_filename(&token, created_at, extension));
        Self {
            token,
            target_path,
            created_at,
        }
    }
}

/// Deterministic output file name: `{token}_{YYYYmmdd_HHMMSS}.{ext}`.
#[must_use]
pub fn output_filename(token: &str, created_at: DateTime<Utc>, extension: &str) -> String {
    format!("{token}_{}.{extension}", created_at.format("%Y%m%d_%H%M%S"))
}
