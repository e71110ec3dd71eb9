use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tripdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for tripdash::AppCommand {
    fn from(cmd: Commands) -> tripdash::AppCommand {
        match cmd {
            Commands::Show { amount } => tripdash::AppCommand::Show { amount },
            Commands::Convert { amount } => tripdash::AppCommand::Convert { amount },
            Commands::Watch { amount } => tripdash::AppCommand::Watch { amount },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch weather, exchange rate and events once and print the dashboard
    Show {
        /// Amount in EUR for the converter
        #[arg(short, long)]
        amount: Option<f64>,
    },
    /// Convert an amount in EUR to JPY at the latest rate
    Convert {
        /// Amount in EUR
        amount: f64,
    },
    /// Keep the dashboard live, refreshing on a timer
    Watch {
        /// Amount in EUR for the converter
        #[arg(short, long)]
        amount: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => tripdash::cli::setup::setup_at_path(path),
            None => tripdash::cli::setup::setup(),
        },
        Some(cmd) => tripdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
