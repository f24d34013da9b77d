//! CLI implementation for `carbio build` command
//!
//! Configures, builds and tests from descriptors written by
//! `carbio generate`. Generation is not repeated here.

use std::path::Path;

use anyhow::Result;

use crate::cli::commands::{open_project, report_stage, Overrides};
use crate::cli::output::{is_json, print_detail, print_json};
use crate::core::orchestrator::Orchestrator;

/// Execute the build command
pub async fn execute(path: &Path, overrides: Overrides, skip_tests: bool) -> Result<()> {
    let mut project = open_project(path, overrides)?;
    let mut orch = Orchestrator::new(&project.runner, &project.resolver).with_observer(&report_stage);
    let ctx = &mut project.ctx;

    orch.apply_options(ctx)?;
    orch.declare_requirements(ctx)?;
    orch.restore_generated(ctx)?;
    orch.configure(ctx)?;
    orch.build(ctx)?;
    if skip_tests {
        tracing::info!("Skipping tests");
    } else {
        orch.test(ctx)?;
    }

    if is_json() {
        return print_json(&serde_json::json!({
            "status": "success",
            "stage": orch.stage(),
            "build_type": ctx.settings.build_type.as_str(),
            "build_dir": ctx.layout.build.display().to_string(),
            "tests_run": !skip_tests,
        }));
    }

    print_detail(&format!("Build folder: {}", ctx.layout.build.display()));
    Ok(())
}
