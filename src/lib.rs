#![forbid(unsafe_code)]
//! Chunked video ingest server.
//!
//! Accepts a live stream of binary container fragments over HTTP and pipes
//! them, in arrival order, into an external transcoding process that writes
//! one finished media file per recording session.

pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod recorder;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
