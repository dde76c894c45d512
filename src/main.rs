use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use twrate::core::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the JSON rate API
    Serve {
        /// Port to listen on, overriding the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Display the spot sell rate of one currency
    Rate {
        /// Currency code, e.g. USD
        #[arg(long)]
        currency: String,
        /// Listing date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Display the full rate listing for a day
    Rates {
        /// Listing date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
}

impl From<Commands> for twrate::AppCommand {
    fn from(cmd: Commands) -> twrate::AppCommand {
        match cmd {
            Commands::Serve { port } => twrate::AppCommand::Serve { port },
            Commands::Rate { currency, date } => twrate::AppCommand::Rate {
                date: date.unwrap_or_else(today),
                currency,
            },
            Commands::Rates { date } => twrate::AppCommand::Rates {
                date: date.unwrap_or_else(today),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Errors are reported once, by the `Result` returned from main.
    match cli.command {
        Some(Commands::Setup) => twrate::cli::setup::setup(),
        Some(cmd) => twrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
