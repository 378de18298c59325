#![forbid(unsafe_code)]

//! `stream-stitch` — chunked video ingest server binary.
//!
//! Bootstraps configuration, binds the HTTP front end, and on shutdown
//! drains every still-registered session so no output file is left
//! partially flushed.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use stream_stitch::config::GlobalConfig;
use stream_stitch::http::{self, AppState};
use stream_stitch::pipeline::ffmpeg::FfmpegFactory;
use stream_stitch::recorder::finalize;
use stream_stitch::recorder::registry::SessionRegistry;
use stream_stitch::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "stream-stitch", about = "Chunked video ingest server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the recordings output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("stream-stitch server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.ensure_output_dir()?;
    let config = Arc::new(config);
    info!(
        port = config.http_port,
        output_dir = %config.output_dir.display(),
        "configuration loaded"
    );

    // ── Build shared application state ──────────────────
    let state = AppState {
        config: Arc::clone(&config),
        registry: Arc::new(SessionRegistry::new()),
        factory: Arc::new(FfmpegFactory::new(config.transcoder.clone())),
    };

    // ── Start the HTTP front end ────────────────────────
    let ct = CancellationToken::new();
    let (listener, addr) = http::bind(&config).await?;
    info!(%addr, "server listening");

    let server_ct = ct.clone();
    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(err) = http::serve(listener, server_state, server_ct).await {
            error!(%err, "http front end failed");
        }
    });

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = server_handle.await;

    // ── Drain sessions: close pipes, await process exit ─
    finalize::shutdown_drain(&state.registry, state.factory.as_ref(), &config.retry).await;

    info!("stream-stitch shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
