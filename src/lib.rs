pub mod cli;
pub mod core;
pub mod providers;
pub mod query;
pub mod server;

use crate::core::config::AppConfig;
use crate::providers::BotRateProvider;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Serve { port: Option<u16> },
    Rate { date: String, currency: String },
    Rates { date: String },
}

/// Loads the config at `config_path`, or the default location when not given.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = BotRateProvider::from_config(&config.providers.bot)?;

    match command {
        AppCommand::Serve { port } => {
            info!("Rate service starting...");
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{}:{}", config.server.host, port)
                .parse()
                .with_context(|| format!("Invalid listen address: {}", config.server.host))?;
            let state = server::AppState::new(Arc::new(provider));
            server::start(addr, state).await
        }
        AppCommand::Rate { date, currency } => {
            cli::rates::show_rate(&provider, &date, &currency).await
        }
        AppCommand::Rates { date } => cli::rates::show_rates(&provider, &date).await,
    }
}
