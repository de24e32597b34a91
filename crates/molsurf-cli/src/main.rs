mod cli;
mod commands;
mod config;
mod error;
mod export;
mod logging;
mod scene_file;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("🚀 molsurf CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!("Setting Rayon global thread pool to {} threads.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e)))?;
    }

    let progress = if cli.quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };

    let command_result = match cli.command {
        Commands::Surface(args) => {
            info!("Dispatching to 'surface' command.");
            commands::surface::run(args, &progress)
        }
        Commands::Interactions(args) => {
            info!("Dispatching to 'interactions' command.");
            commands::interactions::run(args, &progress)
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}
