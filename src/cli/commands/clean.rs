//! CLI implementation for `carbio clean` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::load_recipe;
use crate::cli::output::{is_json, print_detail, print_json, print_success};
use crate::core::clean::clean_project;

/// Execute the clean command
pub async fn execute(path: &Path) -> Result<()> {
    let recipe = load_recipe(path)?;

    let result =
        clean_project(path, Some(&recipe)).with_context(|| "Failed to clean build artifacts")?;

    if is_json() {
        return print_json(&serde_json::json!({
            "status": "success",
            "removed": result.removed.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        }));
    }

    if result.removed.is_empty() {
        print_success("Nothing to clean");
    } else {
        print_success("Cleaned build artifacts:");
        for dir in &result.removed {
            print_detail(&format!("Removed {}", dir.display()));
        }
    }

    Ok(())
}
