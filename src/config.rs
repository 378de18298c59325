//! Global configuration parsing, validation, and defaults.
//!
//! The configuration file is optional: every field has a built-in default
//! matching the reference deployment (port 5000, `recordings/` output
//! directory, stock ffmpeg stream-copy invocation), so the server runs with
//! no config at all. CLI flags override whatever was loaded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

/// External transcoder invocation settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TranscoderConfig {
    /// Transcoder binary name or path.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Container format the capture client streams (passed to `-f`); also
    /// used as the output file extension.
    #[serde(default = "default_input_format")]
    pub input_format: String,
    /// Extra arguments appended before the output path, for operator tuning.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            input_format: default_input_format(),
            extra_args: Vec::new(),
        }
    }
}

fn default_binary() -> String {
    "ffmpeg".into()
}

fn default_input_format() -> String {
    "webm".into()
}

/// Retry policy for chunk delivery into the transcoder pipe.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Respawn-and-retry attempts made inline before a chunk is parked in
    /// the pending queue. Bounds per-upload latency to `1 + n` write
    /// attempts.
    #[serde(default = "default_max_immediate_retries")]
    pub max_immediate_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_immediate_retries: default_max_immediate_retries(),
        }
    }
}

fn default_max_immediate_retries() -> u32 {
    1
}

fn default_http_port() -> u16 {
    5000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recordings")
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP listen port. 0 asks the OS for an ephemeral port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Directory where finished recordings are placed.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Transcoder invocation settings.
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    /// Chunk delivery retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            output_dir: default_output_dir(),
            transcoder: TranscoderConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Create the output directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory cannot be created.
    pub fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|err| {
            AppError::Io(format!(
                "failed to create output dir {}: {err}",
                self.output_dir.display()
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.transcoder.binary.trim().is_empty() {
            return Err(AppError::Config(
                "transcoder.binary must not be empty".into(),
            ));
        }

        if self.transcoder.input_format.trim().is_empty() {
            return Err(AppError::Config(
                "transcoder.input_format must not be empty".into(),
            ));
        }

        // More than a handful of inline respawn attempts turns upload
        // latency unbounded; park in the queue instead.
        if self.retry.max_immediate_retries > 8 {
            return Err(AppError::Config(
                "retry.max_immediate_retries must be 8 or less".into(),
            ));
        }

        Ok(())
    }
}
