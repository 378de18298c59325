//! ffmpeg-backed [`ChunkSink`] implementation.
//!
//! Spawns ffmpeg reading a streamable container from `pipe:0` and writing
//! straight through (`-c copy`, no re-encode) to the session's target path,
//! with `kill_on_drop(true)` so abandoned processes are cleaned up
//! automatically. On pipe close ffmpeg flushes its muxer and finalizes the
//! file, so the output is complete exactly when [`ChunkSink::close`]
//! returns.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

use super::{BoxFuture, ChunkSink, SinkFactory};
use crate::config::TranscoderConfig;
use crate::{AppError, Result};

/// Factory spawning one ffmpeg process per session.
#[derive(Debug, Clone)]
pub struct FfmpegFactory {
    config: TranscoderConfig,
}

impl FfmpegFactory {
    /// Build a factory from the transcoder configuration.
    #[must_use]
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    async fn spawn_process(&self, target: &Path) -> Result<FfmpegSink> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", &self.config.input_format])
            .args(["-i", "pipe:0", "-c", "copy"])
            .args(&self.config.extra_args)
            .arg(target)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            AppError::Spawn(format!(
                "failed to spawn {}: {err}",
                self.config.binary
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture transcoder stdin".into()))?;

        info!(target = %target.display(), "transcoder spawned");

        Ok(FfmpegSink {
            child,
            stdin: Some(stdin),
        })
    }
}

impl SinkFactory for FfmpegFactory {
    fn spawn<'a>(&'a self, target: &'a Path) -> BoxFuture<'a, Result<Box<dyn ChunkSink>>> {
        Box::pin(async move {
            let sink = self.spawn_process(target).await?;
            Ok(Box::new(sink) as Box<dyn ChunkSink>)
        })
    }
}

/// Live ffmpeg process handle plus its stdin pipe.
///
/// `stdin` becomes `None` once closed; the child handle is kept so `close`
/// can await process exit.
#[derive(Debug)]
pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ChunkSink for FfmpegSink {
    fn write<'a>(&'a mut self, bytes: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(stdin) = self.stdin.as_mut() else {
                return Err(AppError::Pipe("transcoder stdin already closed".into()));
            };

            stdin
                .write_all(bytes)
                .await
                .map_err(|err| AppError::Pipe(format!("write to transcoder failed: {err}")))?;
            stdin
                .flush()
                .await
                .map_err(|err| AppError::Pipe(format!("flush to transcoder failed: {err}")))?;

            debug!(len = bytes.len(), "chunk written to transcoder pipe");
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            // Dropping stdin delivers EOF; ffmpeg then finalizes the file
            // and exits. No timeout here: a hung transcoder hangs the merge.
            drop(self.stdin.take());

            let status = self
                .child
                .wait()
                .await
                .map_err(|err| AppError::Pipe(format!("failed to await transcoder: {err}")))?;

            if status.success() {
                info!("transcoder exited cleanly");
                Ok(())
            } else {
                warn!(?status, "transcoder exited with failure status");
                Err(AppError::Pipe(format!(
                    "transcoder exited with {status}"
                )))
            }
        })
    }
}
