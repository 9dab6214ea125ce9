//! Slooze CLI - terminal front end for the food-ordering dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell against the default backend (http://localhost:4000)
//! slooze
//!
//! # Point at another backend and keep the session between runs
//! slooze --api-url https://api.slooze.xyz --session-file ~/.slooze/session.json
//!
//! # One-shot commands (need a session file to stay signed in)
//! slooze --session-file ~/.slooze/session.json login nick@slooze.xyz password123
//! slooze --session-file ~/.slooze/session.json orders pending
//! ```
//!
//! # Environment Variables
//!
//! - `SLOOZE_API_URL` - Backend base URL
//! - `SLOOZE_REQUEST_TIMEOUT_SECS` - Request timeout
//! - `SLOOZE_SESSION_FILE` - Session file
//! - `SLOOZE_PASSWORD` - Password for `login` when not given inline
//! - `RUST_LOG` - Log filter (default: `slooze_dashboard=info,slooze_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::PathBuf;

use clap::Parser;
use slooze_dashboard::config::{DashboardConfig, parse_api_url};
use slooze_dashboard::store::SessionPersistence;
use slooze_dashboard::Dashboard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod render;
mod shell;

use commands::{CliError, ShellCommand};

#[derive(Parser)]
#[command(name = "slooze")]
#[command(author, version, about = "Slooze food-ordering dashboard")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "SLOOZE_API_URL")]
    api_url: Option<String>,

    /// Keep the session in this file between runs
    #[arg(long, env = "SLOOZE_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Run one command and exit instead of starting the shell
    #[command(subcommand)]
    command: Option<ShellCommand>,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slooze_dashboard=info,slooze_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load .env before clap reads its env fallbacks
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = DashboardConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config.api_url = parse_api_url(api_url)?;
    }
    if let Some(path) = cli.session_file {
        config.session = SessionPersistence::File(path);
    }
    tracing::debug!(api_url = %config.api_url, session = ?config.session, "Configuration loaded");

    let mut dashboard = Dashboard::from_config(&config, Box::new(shell::TerminalNotifier))?;

    let Some(command) = cli.command else {
        return shell::run(&mut dashboard).await;
    };

    let mut out = io::stdout();
    let result = commands::execute(&mut dashboard, command, &mut out).await;
    render::write_notices(&mut out, &dashboard.take_notices())?;
    result.map(|_| ())
}
