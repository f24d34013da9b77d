//! CLI implementation for `carbio info` command
//!
//! Shows the declared requirements with their roles and options, how they
//! resolve against the package store, and the build layout.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::cli::commands::{open_project, Overrides};
use crate::cli::output::{is_json, print_detail, print_info, print_json};
use crate::core::dependency::Requirements;
use crate::core::options::{cmake_value, PackageOptions};
use crate::core::resolver::DependencyResolver;

#[derive(Debug, Serialize)]
struct DependencyInfo {
    name: String,
    version: String,
    role: String,
    target: String,
    resolved: Option<String>,
    options: PackageOptions,
}

#[derive(Debug, Serialize)]
struct LayoutInfo {
    source: String,
    generators: String,
    build: String,
    package: String,
}

/// Execute the info command
pub async fn execute(path: &Path) -> Result<()> {
    let project = open_project(path, Overrides::default())?;
    let ctx = &project.ctx;

    let mut requirements = Requirements::new();
    ctx.recipe.declare_into(&mut requirements)?;

    let mut dependencies = Vec::with_capacity(requirements.len());
    for declaration in requirements.all() {
        let options = ctx.options.for_package(&declaration.name);
        let resolved = project.resolver.resolve(declaration, &options)?;
        dependencies.push(DependencyInfo {
            name: declaration.name.clone(),
            version: declaration.version.to_string(),
            role: declaration.role.to_string(),
            target: declaration.target(),
            resolved: resolved.map(|r| r.version.to_string()),
            options,
        });
    }

    let layout = LayoutInfo {
        source: ctx.layout.source.display().to_string(),
        generators: ctx.layout.generators.display().to_string(),
        build: ctx.layout.build.display().to_string(),
        package: ctx.layout.package.display().to_string(),
    };

    if is_json() {
        return print_json(&serde_json::json!({
            "project": ctx.recipe.project,
            "settings": ctx.settings,
            "dependencies": dependencies,
            "layout": layout,
            "store": project.resolver.root().display().to_string(),
        }));
    }

    print_info(&format!(
        "{} {} ({} {}, {})",
        ctx.recipe.project.name,
        ctx.recipe.project.version,
        ctx.settings.os,
        ctx.settings.arch,
        ctx.settings.build_type
    ));

    println!();
    println!("Dependencies:");
    for dep in &dependencies {
        let status = dep
            .resolved
            .as_ref()
            .map_or_else(|| "not installed".to_string(), |v| format!("resolved {v}"));
        println!("  {}/{} [{}] {} ({status})", dep.name, dep.version, dep.role, dep.target);
        for (option, value) in &dep.options {
            print_detail(&format!("{option} = {}", cmake_value(value)));
        }
    }

    println!();
    println!("Layout:");
    println!("  generators: {}", layout.generators);
    println!("  build:      {}", layout.build);
    println!("  package:    {}", layout.package);
    println!("  store:      {}", project.resolver.root().display());

    Ok(())
}
