//! Uploaded chunk model.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One uploaded fragment of a session's container bitstream.
///
/// Chunks are delivered to the transcoder pipe strictly in HTTP-arrival
/// order. The client-supplied `part_hint` is accepted for diagnostics only
/// and is never used to reorder or deduplicate.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Token of the owning session.
    pub session_token: String,
    /// Client-supplied sequence hint. Not authoritative; kept for forward
    /// compatibility and log correlation.
    pub part_hint: Option<u64>,
    /// Raw payload bytes.
    pub payload: Bytes,
    /// Server-side arrival timestamp.
    pub received_at: DateTime<Utc>,
}

impl Chunk {
    /// Construct a chunk stamped with the current arrival time.
    #[must_use]
    pub fn new(session_token: String, part_hint: Option<u64>, payload: Bytes) -> Self {
        Self {
            session_token,
            part_hint,
            payload,
            received_at: Utc::now(),
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
