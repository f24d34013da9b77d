//! CLI command for `carbio doctor`
//!
//! Checks build tools and the project setup, with suggestions for fixes.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{
    create_spinner, is_json, is_quiet, print_detail, print_info, print_json, print_success,
    print_warning, status,
};
use crate::config::defaults;
use crate::core::doctor::run_doctor;
use crate::core::global_config::GlobalConfig;
use crate::core::recipe::Recipe;
use crate::infra::dirs::CarbioDirs;

/// Execute the doctor command
pub async fn execute(project_dir: &Path) -> Result<()> {
    let dirs = CarbioDirs::new();
    let global = GlobalConfig::load(&dirs).context("Failed to load global configuration")?;
    let store = global.store_dir(&dirs);

    // Tool overrides from the recipe apply when it is readable
    let recipe_path = project_dir.join(defaults::RECIPE_FILE);
    let recipe = Recipe::load(&recipe_path).ok();
    let tools = recipe.as_ref().map(|r| &r.tools);
    let cmake = global.cmake(tools.and_then(|t| t.cmake.as_deref()));
    let ctest = global.ctest(tools.and_then(|t| t.ctest.as_deref()));
    let project = recipe_path
        .exists()
        .then_some((project_dir, store.as_path()));

    let spinner = create_spinner("Checking build tools...");
    let report = run_doctor(&cmake, &ctest, project);
    spinner.finish_and_clear();

    let failed_required = report.failed_required();

    if is_json() {
        let status = if report.all_passed() {
            "success"
        } else if failed_required.is_empty() {
            "warning"
        } else {
            "error"
        };
        print_json(&serde_json::json!({
            "status": status,
            "checks": report.checks,
            "config_issues": report.config_issues,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len(),
            "store": store.display().to_string(),
        }))?;
        if !failed_required.is_empty() {
            anyhow::bail!("Missing required build tools");
        }
        return Ok(());
    }

    if is_quiet() {
        if !failed_required.is_empty() {
            for check in &failed_required {
                eprintln!("{} Missing required: {}", status::ERROR, check.name);
            }
            anyhow::bail!("Missing required build tools");
        }
        return Ok(());
    }

    print_info("Checking build tools...");
    println!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            println!("  {} {}{version_str}{required_str}", status::SUCCESS, check.name);
        } else {
            println!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    if !report.config_issues.is_empty() {
        println!();
        print_warning("Project issues:");
        for issue in &report.config_issues {
            print_detail(&format!("• {issue}"));
        }
    }

    println!();
    let passed = report.passed_count();
    let total = report.checks.len();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
    } else if failed_required.is_empty() {
        print_warning(&format!("{passed}/{total} checks passed (optional tools or project issues)"));
    } else {
        println!("{} {passed}/{total} checks passed", status::ERROR);
        anyhow::bail!("Missing required build tools. Run 'carbio doctor' for details.");
    }

    Ok(())
}
