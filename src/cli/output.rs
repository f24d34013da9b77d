//! Output formatting and progress indicators
//!
//! Spinners, status lines and the global quiet/JSON output modes.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::OnceLock;

use crate::error::CarbioError;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Output mode selected by the global flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub json: bool,
    pub verbose: u8,
}

static OUTPUT: OnceLock<OutputConfig> = OnceLock::new();

impl OutputConfig {
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Install as the process-wide output mode; the first call wins
    pub fn apply_global(self) {
        let _ = OUTPUT.set(self);
    }

    pub fn global() -> Self {
        OUTPUT.get().copied().unwrap_or_default()
    }

    /// Log filter directive for this verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

pub fn is_quiet() -> bool {
    OutputConfig::global().quiet
}

pub fn is_json() -> bool {
    OutputConfig::global().json
}

/// Spinners and status lines are only shown in plain interactive mode
fn is_plain() -> bool {
    !is_quiet() && !is_json()
}

/// Create a spinner for operations with unknown duration
///
/// Hidden in quiet and JSON modes.
pub fn create_spinner(message: &str) -> ProgressBar {
    if !is_plain() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

pub fn print_success(message: &str) {
    if is_plain() {
        println!("{} {message}", status::SUCCESS);
    }
}

pub fn print_info(message: &str) {
    if is_plain() {
        println!("{} {message}", status::INFO);
    }
}

/// Warnings go to stderr and survive quiet mode
pub fn print_warning(message: &str) {
    if !is_json() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Indented detail line under a status line
pub fn print_detail(message: &str) {
    if is_plain() {
        println!("    {message}");
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error and its cause chain to stderr
///
/// In JSON mode the error is a single object on stdout.
pub fn display_error(error: &anyhow::Error) {
    let tool = error
        .downcast_ref::<CarbioError>()
        .and_then(CarbioError::tool_failure);

    if is_json() {
        let value = serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "causes": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
            "exit_code": exit_code(error),
            "command": tool.map(|t| t.command.clone()),
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return;
    }

    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Process exit code for an error: a failed tool's own code, else 1
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<CarbioError>()
        .map_or(1, CarbioError::exit_code)
}
