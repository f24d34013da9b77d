//! Command-line surface of carbio
//!
//! `generate`, `build`, `package` and `create` map onto the orchestrator's
//! stages; `init`, `info`, `clean` and `doctor` are project utilities.
//! Output modes (`-v`, `-q`, `--json`) are global and handled by [`output`].

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use commands::Commands;

/// Carbio - CMake build orchestrator
///
/// Writes a toolchain file and per-dependency CMake descriptors from the
/// local package store, then configures, builds, tests and installs the
/// project through cmake and ctest.
#[derive(Parser, Debug)]
#[command(name = "carbio", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log stage progress (-v) or every tool invocation (-vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print errors only; tool output is captured
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print one JSON object per command on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Run the selected command, or print help when none was given
    pub async fn run(self) -> Result<()> {
        match self.command {
            Some(command) => command.run().await,
            None => {
                Self::command().print_help()?;
                Ok(())
            }
        }
    }
}
