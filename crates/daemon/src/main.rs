// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pfd`: the plugin build daemon.

use std::process::ExitCode;
use std::sync::Arc;

use pf_daemon::{startup, Config, ListenCtx, Listener, StartupResult};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pfd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("pfd: cannot open log in {}: {}", config.state_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let StartupResult { mut daemon, listener } = match startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!("startup failed: {}", e);
            eprintln!("pfd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx::new(&daemon, Arc::clone(&shutdown)));
    tokio::spawn(Listener::new(listener, ctx).run());

    info!(state_dir = %config.state_dir.display(), "daemon ready");
    println!("READY");

    wait_for_shutdown(&shutdown).await;

    match daemon.shutdown() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("shutdown failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to `daemon.log` through a non-blocking writer. `RUST_LOG` overrides
/// the default `info` filter.
fn init_logging(config: &Config) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(guard)
}

/// Resolve on a `Shutdown` request, ctrl-c or SIGTERM.
async fn wait_for_shutdown(shutdown: &Notify) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(e) => {
            error!("cannot install SIGTERM handler: {}", e);
            None
        }
    };
    let terminated = async {
        match sigterm.as_mut() {
            Some(sigterm) => {
                sigterm.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown.notified() => info!("shutdown requested"),
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = terminated => info!("terminated"),
    }
}
