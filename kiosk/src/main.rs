//! Ticketera CLI entry point.
//!
//! Configuration is loaded from environment variables (and a `.env` file if
//! present). `--data-dir` overrides `TICKETERA_DATA_DIR`.
//!
//! Exit codes: 0 on success, 2 for a notice (ticket already claimed today),
//! 1 for any other failure.

use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use ticketera::{Cli, Config, EXIT_FAILURE, EXIT_OK, Kiosk, KioskError, handler};
use ticketera_core::environment::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(err) => {
            let kiosk_error = err.downcast_ref::<KioskError>();
            let code = kiosk_error.map_or(EXIT_FAILURE, KioskError::exit_code);
            if kiosk_error.is_some_and(KioskError::is_notice) {
                eprintln!("Notice: {err}");
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env().map_err(KioskError::from)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    tracing::debug!(?config, "Configuration loaded");

    let mut kiosk = Kiosk::open(&config, Arc::new(SystemClock))
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    handler::run(&mut kiosk, cli, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Initialize logging with tracing, on stderr so receipts on stdout stay clean
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "ticketera=debug" } else { "ticketera=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
