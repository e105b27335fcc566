//! Sweeper — deletes objects a blob store still holds but the database no
//! longer references. One invocation performs a single pass over every
//! configured cleaning run and exits; scheduling repeated passes is left to
//! an external harness (cron, systemd timers).

use anyhow::{Context, Result};
use clap::Parser;
use sweeper::config::Configuration;
use sweeper::runner;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sweeper.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Load configuration
    let config = if std::path::Path::new(&args.config).exists() {
        Configuration::load_from_path(std::path::Path::new(&args.config))
            .context("Failed to load configuration")?
    } else {
        log::info!("Configuration file not found, using defaults");
        Configuration::default()
    };

    if config.cleaning_runs.is_empty() {
        log::info!("No cleaning runs configured, nothing to do");
        return Ok(());
    }

    log::info!(
        "Starting cleaning pass over {} configured runs",
        config.cleaning_runs.len()
    );

    let reports = runner::run_all(&config).await;

    let completed = reports.iter().filter(|r| r.outcome.is_ok()).count();
    let deleted: usize = reports
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|s| s.deleted)
        .sum();
    let delete_failures: usize = reports
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|s| s.failed.len())
        .sum();

    // A misconfigured or unreachable backend pair must not fail the whole
    // job; the pass reports its tally and exits cleanly either way.
    log::info!(
        "Cleaning pass finished: {}/{} runs completed, {} objects deleted, {} delete failures",
        completed,
        reports.len(),
        deleted,
        delete_failures
    );

    Ok(())
}
