pub mod cli;
pub mod core;
pub mod providers;
pub mod sync;

pub use crate::core::config;

use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Show { amount: Option<f64> },
    Convert { amount: f64 },
    Watch { amount: Option<f64> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("tripdash starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Show { amount } => cli::show::run(&config, amount).await,
        AppCommand::Convert { amount } => cli::convert::run(&config, amount).await,
        AppCommand::Watch { amount } => cli::watch::run(&config, amount).await,
    }
}
