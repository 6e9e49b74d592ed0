//! Scrappit - rate-limited Reddit JSON fetcher
//!
//! CLI entry point: submits one operation to the scheduler and prints its result.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use scrappit::cli::Cli;
use scrappit::config::Config;
use scrappit::scheduler::{Scheduler, TaskResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrappit")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("scrappit.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Poll until a result arrives or the deadline passes
async fn wait_for_result(scheduler: &Scheduler, wait: Duration) -> Option<TaskResult> {
    debug!(?wait, "wait_for_result: called");
    let deadline = Instant::now() + wait;
    loop {
        if let Some(result) = scheduler.poll_result() {
            return Some(result);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(base_url = %config.client.base_url, "Scrappit loaded config");

    let scheduler = Scheduler::from_config(&config).context("Failed to create scheduler")?;
    let (operation, priority) = cli.command.into_request();
    let handle = scheduler.submit(operation, priority);
    info!(id = %handle.id, priority = handle.priority, "main: submitted");

    scheduler.start().context("Failed to start scheduler")?;
    let result = wait_for_result(&scheduler, Duration::from_secs(cli.wait_secs)).await;
    scheduler.stop();

    let Some(result) = result else {
        warn!(id = %handle.id, "main: timed out waiting for result");
        return Err(eyre!("Timed out after {}s waiting for task {}", cli.wait_secs, handle.id));
    };

    match result.value {
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).context("Failed to format result")?;
            println!("{}", pretty);
            Ok(())
        }
        Err(e) => {
            warn!(id = %result.task.id, error = %e, "main: task failed");
            eprintln!("{} task {} failed: {}", "error:".red().bold(), result.task.id, e);
            std::process::exit(1);
        }
    }
}
