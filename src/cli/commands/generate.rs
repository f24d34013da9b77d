//! CLI implementation for `carbio generate` command
//!
//! Applies options, declares requirements and writes the toolchain and
//! dependency descriptors into the generators folder.

use std::path::Path;

use anyhow::Result;

use crate::cli::commands::{open_project, report_stage, Overrides};
use crate::cli::output::{is_json, print_detail, print_json, print_warning};
use crate::core::orchestrator::Orchestrator;

/// Execute the generate command
pub async fn execute(path: &Path, overrides: Overrides) -> Result<()> {
    let mut project = open_project(path, overrides)?;
    let mut orch = Orchestrator::new(&project.runner, &project.resolver).with_observer(&report_stage);

    orch.generate(&mut project.ctx)?;

    let ctx = &project.ctx;
    let unresolved = orch.unresolved();

    if is_json() {
        return print_json(&serde_json::json!({
            "status": "success",
            "stage": orch.stage(),
            "generators": ctx.layout.generators.display().to_string(),
            "fingerprint": orch.fingerprint(),
            "unresolved": unresolved,
        }));
    }

    print_detail(&format!("Generators: {}", ctx.layout.generators.display()));
    for reference in unresolved {
        print_warning(&format!(
            "{reference} is not installed in {}; configure will fail until it is",
            project.resolver.root().display()
        ));
    }

    Ok(())
}
