//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// External transcoder process could not be started.
    Spawn(String),
    /// Write to the transcoder stdin pipe failed (broken pipe, closed
    /// handle, or OS-level I/O error), or the process exited abnormally.
    Pipe(String),
    /// Requested session does not exist or could not be resolved.
    NotFound(String),
    /// File-system or I/O operation failure outside the pipe itself.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Pipe(msg) => write!(f, "pipe: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
