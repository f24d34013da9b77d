//! Carbio CLI - CMake build orchestrator
//!
//! Entry point for the carbio command-line application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use carbio::cli::output::{display_error, exit_code, OutputConfig};
use carbio::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);
    output_config.apply_global();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(output_config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(exit_code(&e));
        }
    }
}
