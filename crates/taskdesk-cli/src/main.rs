//! taskdesk - a command-line client for the taskdesk task list service.
//!
//! Manages a personal task list and, for admins, user accounts. The session
//! persists between runs; access tokens are refreshed transparently.

mod cli;
mod commands;
mod format;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskdesk_core::config::APP_NAME;
use taskdesk_core::{AppContext, Config, SessionState};

use cli::{Cli, Command};

/// Initialize the tracing subscriber for logging.
///
/// Stderr gets `RUST_LOG` (default `warn`, or `debug` with `--verbose`);
/// a daily log file always records at debug level.
fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "taskdesk_core=debug,taskdesk=debug,warn" } else { "warn" })
    });
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(stderr_filter);

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("logs");

    if std::fs::create_dir_all(&log_dir).is_err() {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "taskdesk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("taskdesk_core=debug,taskdesk=debug,info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Some(guard)
}

/// Tell the user when the session ends underneath a running command.
fn spawn_session_watcher(ctx: &AppContext) {
    let mut rx = ctx.projection.subscribe();
    tokio::spawn(async move {
        let mut was_authenticated = rx.borrow().is_authenticated();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if was_authenticated && state == SessionState::Anonymous {
                eprintln!("Your session has ended. Run `taskdesk login` to sign in again.");
            }
            was_authenticated = state.is_authenticated();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose);
    info!("taskdesk starting");

    let config = Config::load().context("Failed to load configuration")?;
    debug!(api = %config.api_base_url, storage = ?config.storage, "Configuration loaded");
    let mut ctx = AppContext::from_config(config).context("Failed to initialize client")?;

    // Registration and login don't need the stored session restored first
    if !matches!(cli.command, Command::Register(_) | Command::Login { .. }) {
        if let Err(e) = ctx.session.restore().await {
            warn!(error = %e, "Failed to read stored credentials");
        }
    }
    if matches!(cli.command, Command::Todos(_) | Command::Users(_)) {
        spawn_session_watcher(&ctx);
    }

    let result = match cli.command {
        Command::Login { login } => commands::login(&mut ctx, login).await,
        Command::Register(args) => commands::register(&ctx, args).await,
        Command::Logout => commands::logout(&ctx).await,
        Command::Whoami => commands::whoami(&ctx),
        Command::Todos(command) => commands::todos(&ctx, command).await,
        Command::Users(command) => commands::users(&ctx, command).await,
    };

    info!("taskdesk shutting down");
    result
}
