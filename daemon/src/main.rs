//! agegate daemon — entry point for running the verification service.

use agegate_api::{init_logging, ApiServer, AppState, LogFormat, ServiceConfig};
use agegate_types::Timestamp;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "agegate-daemon", about = "agegate verification service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP listener to.
    #[arg(long, env = "AGEGATE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// HTTP port.
    #[arg(long, env = "AGEGATE_PORT")]
    port: Option<u16>,

    /// Public base URL providers call back to.
    #[arg(long, env = "AGEGATE_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Provider new sessions use: "veriff", "persona", or "yoti".
    #[arg(long, env = "AGEGATE_PROVIDER")]
    provider: Option<String>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "AGEGATE_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGEGATE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let path = path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("config path is not valid UTF-8"))?;
            ServiceConfig::from_toml_file(path)?
        }
        None => ServiceConfig::default(),
    };

    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(public_base_url) = cli.public_base_url {
        config.public_base_url = public_base_url;
    }
    if let Some(provider) = &cli.provider {
        config.provider = provider.parse()?;
    }
    if cli.metrics {
        config.enable_metrics = true;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    init_logging(LogFormat::from_config(&config.log_format), &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }
    tracing::info!(
        "starting agegate on {}:{} (provider: {}, metrics: {})",
        config.bind_addr,
        config.port,
        config.provider,
        if config.enable_metrics { "on" } else { "off" },
    );

    let state = AppState::from_config(config.clone())?;

    // Periodic sweep of stale pending sessions to `expired`.
    let sweeper = state.orchestrator.clone();
    let max_age_millis = config.session_max_age_secs * 1000;
    let sweep_interval = Duration::from_secs(config.expiry_sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match sweeper.expire_stale_sessions(max_age_millis, Timestamp::now()) {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "expired stale verification sessions"),
                Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
            }
        }
    });

    ApiServer::new(state).start().await?;

    tracing::info!("agegate daemon exited cleanly");
    Ok(())
}
