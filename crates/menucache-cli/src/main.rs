//! menucache - browse the Little Lemon menu from the terminal.
//!
//! The menu is cached locally so searches work offline; `sync` refreshes
//! the cache from the remote endpoint.

mod app;
mod render;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Parser, Debug)]
#[command(name = "menucache", version, about = "Local cache of the Little Lemon menu")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the local menu with the latest remote menu
    Sync {
        /// Only sync when the local menu is older than the configured limit
        #[arg(long)]
        if_stale: bool,
    },
    /// Search the local menu by dish name
    Search {
        /// Case-insensitive part of a dish name; omit to list everything
        term: Option<String>,
        /// Refresh in the background and show updated results when they arrive
        #[arg(long)]
        refresh: bool,
    },
    /// Show cache location, size and age
    Status,
    /// Save your name and email and log in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// Show the saved profile
    Profile,
    /// Log out, keeping the saved profile
    Logout,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "menucache.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_ref());
    info!("menucache starting");

    let app = App::new()?;

    match cli.command {
        Command::Sync { if_stale } => app.sync(if_stale).await,
        Command::Search { term, refresh } => {
            let term = term.unwrap_or_default();
            if refresh {
                app.search_and_refresh(&term).await
            } else {
                app.search(&term)
            }
        }
        Command::Status => app.status(),
        Command::Register {
            first_name,
            last_name,
            email,
        } => app.register(&first_name, &last_name, &email),
        Command::Profile => app.show_profile(),
        Command::Logout => app.logout(),
    }
}
