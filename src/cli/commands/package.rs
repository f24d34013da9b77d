//! CLI implementation for `carbio package` command
//!
//! Installs from an existing build tree. Requires a successful
//! `carbio build` against the current descriptors; never configures.

use std::path::Path;

use anyhow::Result;

use crate::cli::commands::{open_project, report_stage, Overrides};
use crate::cli::output::{is_json, print_detail, print_json};
use crate::core::orchestrator::Orchestrator;
use crate::core::package::PackageReport;

/// Execute the package command
pub async fn execute(path: &Path, overrides: Overrides) -> Result<()> {
    let mut project = open_project(path, overrides)?;
    let mut orch = Orchestrator::new(&project.runner, &project.resolver).with_observer(&report_stage);
    let ctx = &mut project.ctx;

    orch.apply_options(ctx)?;
    orch.declare_requirements(ctx)?;
    orch.restore_built(ctx)?;
    let report = orch.package(ctx)?;

    print_report(&report)
}

/// Print a package report in the active output mode
pub fn print_report(report: &PackageReport) -> Result<()> {
    if is_json() {
        return print_json(&serde_json::json!({
            "status": "success",
            "package": report,
        }));
    }

    print_detail(&format!(
        "{} {} -> {} ({} files)",
        report.name, report.version, report.package_dir, report.files
    ));
    Ok(())
}
