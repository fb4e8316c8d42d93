//! ticktrack – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise tracing (plain or JSON on stderr).
//! 3. Parse the command line and dispatch.

mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::debug;

use crate::cli::Cli;
use crate::commands::App;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: TICKTRACK_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'warn'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("warn")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // ── 3. Dispatch ────────────────────────────────────────────────────────────
    let cli = Cli::parse();
    debug!(version = env!("CARGO_PKG_VERSION"), api_url = %cfg.api_url, "ticktrack starting");

    let app = App::new(cfg)?;
    app.run(cli.command).await
}
