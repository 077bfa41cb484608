//! Budget automation server
//!
//! Serves the HTTP API, or with `--once` runs a single batch and prints the
//! report as JSON.

use ads_automation::RunRequest;
use ads_config::{AppConfig, LoggingConfig};
use ads_core::ExecutionSource;
use ads_server::{bootstrap, start_server, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "budget-autopilot")]
#[command(about = "Metric-driven ad budget automation", long_about = None)]
struct Cli {
    /// Directory holding budget_autopilot.yaml
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    /// Run one batch, print the report and exit
    #[arg(long)]
    once: bool,

    /// Only evaluate this owner's rules (with --once)
    #[arg(long, requires = "once")]
    owner: Option<String>,

    /// Read budgets but only log changes
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if cli.dry_run {
        config.automation.dry_run = true;
    }
    init_tracing(&config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting budget autopilot");
    let app = bootstrap(&config)
        .await
        .context("loading automation dataset")?;

    if cli.once {
        let mut request = RunRequest::new(ExecutionSource::Manual);
        if let Some(owner) = cli.owner {
            request = request.for_owner(owner);
        }
        let report = app.engine.run(request).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.success {
            anyhow::bail!(report.message.unwrap_or_else(|| "run failed".to_string()));
        }
        return Ok(());
    }

    let addr = config.server.address();
    let state = AppState::new(app.engine);
    tokio::select! {
        result = start_server(state, &addr) => result.with_context(|| format!("serving on {}", addr))?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down...");
        }
    }

    Ok(())
}

/// Logs go to stderr so `--once` output stays valid JSON
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
