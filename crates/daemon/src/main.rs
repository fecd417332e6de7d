// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verdict daemon (verdictd)
//!
//! Wires the job service to its collaborators, re-drives jobs left over
//! from the previous run, and serves the control socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod listener;
mod protocol;
mod registry_file;

use std::fs::File;
use std::sync::Arc;

use fs2::FileExt;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::Config;
use crate::listener::DaemonService;
use crate::registry_file::{FileRegistry, StaticUsers};
use verdict_core::SystemClock;
use verdict_engine::JobService;
use verdict_store::{MemoryAttachmentStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("verdictd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("verdictd {}", env!("CARGO_PKG_VERSION"));
                println!("Verdict daemon - runs analyzer jobs and serves the control socket");
                println!();
                println!("USAGE:");
                println!("    verdictd");
                println!();
                println!("State lives in $VERDICT_STATE_DIR (default .verdict), which holds");
                println!("verdict.toml, the analyzers directory, the socket, and the log.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: verdictd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    rotate_startup_log(&config.log_path);
    let _log_guard = init_tracing(&config);

    info!("starting verdictd");

    // One daemon per state directory.
    let lock_file = File::create(&config.lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!("verdictd is already running in {}", config.state_dir.display());
        std::process::exit(1);
    }

    let registry = FileRegistry::load(&config.analyzers_dir)?;
    info!(analyzers = registry.len(), "registry loaded");

    let service: Arc<DaemonService> = Arc::new(JobService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAttachmentStore::new()),
        Arc::new(registry),
        Arc::new(StaticUsers::new(config.users.clone())),
        SystemClock,
        config.service.clone(),
    ));

    // Re-drive whatever the previous incarnation left behind before
    // accepting new submissions.
    let recovered = service.recover().await?;
    info!(
        interrupted = recovered.interrupted,
        resumed = recovered.resumed,
        "recovery scan complete"
    );

    // Bind the control socket, clearing a stale one from a dead daemon.
    let _ = std::fs::remove_file(&config.socket_path);
    let socket = UnixListener::bind(&config.socket_path)?;
    info!(socket = %config.socket_path.display(), "listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = listener::run(socket, Arc::clone(&service)) => {
            error!("listener stopped unexpectedly");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
        }
    }

    // In-flight analyzers are not drained; their jobs reappear to the
    // recovery scan on next start.
    let _ = std::fs::remove_file(&config.socket_path);
    info!("verdictd stopped");
    Ok(())
}

/// Log files larger than this are rotated away at startup.
const LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated generations kept on disk (`verdictd.log.1` .. `.3`).
const LOG_GENERATIONS: u32 = 3;

/// Startup log rotation: once the live log passes [`LOG_ROTATE_BYTES`],
/// shift each kept generation up by one and start fresh. Best-effort;
/// a failed rename never blocks startup.
fn rotate_startup_log(log_path: &std::path::Path) {
    let oversized = std::fs::metadata(log_path)
        .map(|m| m.len() >= LOG_ROTATE_BYTES)
        .unwrap_or(false);
    if !oversized {
        return;
    }

    let generation = |n: u32| std::path::PathBuf::from(format!("{}.{n}", log_path.display()));
    let _ = std::fs::remove_file(generation(LOG_GENERATIONS));
    for n in (1..LOG_GENERATIONS).rev() {
        let _ = std::fs::rename(generation(n), generation(n + 1));
    }
    let _ = std::fs::rename(log_path, generation(1));
}

/// Non-blocking file logging into the state directory, filtered by
/// `RUST_LOG` (default `info`). The returned guard must outlive the
/// daemon or buffered lines are lost.
fn init_tracing(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, keepalive) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &config.state_dir,
        "verdictd.log",
    ));
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(writer))
        .init();
    keepalive
}
