//! CLI implementation for `carbio init` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_json, print_success};
use crate::config::defaults;
use crate::core::init::{init_project, InitOptions};

/// Execute the init command
pub async fn execute(path: &Path, force: bool) -> Result<()> {
    let result = init_project(path, &InitOptions { force })
        .with_context(|| format!("Failed to initialize {}", path.display()))?;

    if is_json() {
        return print_json(&serde_json::json!({
            "status": "success",
            "project": result.project_name,
            "recipe": result.recipe_path.display().to_string(),
            "gitignore_updated": result.gitignore_updated,
        }));
    }

    print_success(&format!(
        "Initialized carbio project '{}' in {}",
        result.project_name,
        path.display()
    ));
    print_detail(&format!("Wrote {}", defaults::RECIPE_FILE));
    if result.gitignore_updated {
        print_detail("Updated .gitignore");
    }
    print_detail("Next: install dependencies into the package store, then run 'carbio create'");

    Ok(())
}
