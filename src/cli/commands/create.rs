//! CLI implementation for `carbio create` command
//!
//! Runs the whole sequence: generate, configure, build, test and package.

use std::path::Path;

use anyhow::Result;

use crate::cli::commands::package::print_report;
use crate::cli::commands::{open_project, report_stage, Overrides};
use crate::cli::output::print_warning;
use crate::core::orchestrator::{Orchestrator, RunOptions};

/// Execute the create command
pub async fn execute(path: &Path, overrides: Overrides, skip_tests: bool) -> Result<()> {
    let mut project = open_project(path, overrides)?;
    let mut orch = Orchestrator::new(&project.runner, &project.resolver).with_observer(&report_stage);

    if skip_tests {
        print_warning("Tests are skipped; the package is not verified");
    }

    let report = orch.run_all(&mut project.ctx, RunOptions { skip_tests })?;
    print_report(&report)
}
