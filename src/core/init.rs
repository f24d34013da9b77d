//! Project initialization logic
//!
//! Writes the default recipe into an existing C++ project and makes sure
//! generated folders are ignored by git.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::recipe::Recipe;
use crate::error::InitError;

/// Entries to add to .gitignore
pub const GITIGNORE_ENTRIES: &[&str] = &["build/", "package/"];

/// Marker comment for the carbio section in .gitignore
pub const GITIGNORE_MARKER: &str = "# carbio";

/// Options for project initialization
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Overwrite an existing recipe
    pub force: bool,
}

/// Result of initialization
#[derive(Debug)]
pub struct InitResult {
    pub recipe_path: PathBuf,
    /// Whether .gitignore was created or updated
    pub gitignore_updated: bool,
    pub project_name: String,
}

/// Render the default recipe for `project_name`
pub fn generate_recipe_content(project_name: &str) -> Result<String, InitError> {
    let mut recipe = Recipe::carbio_default();
    recipe.project.name = project_name.to_string();

    let body = recipe.to_toml().map_err(|e| InitError::Render {
        error: e.to_string(),
    })?;
    Ok(format!(
        "# carbio recipe\n\
         # Dependencies are resolved from the local package store; see `carbio info`.\n\n\
         {body}"
    ))
}

/// Generate .gitignore content for carbio
pub fn generate_gitignore_content() -> String {
    let mut content = String::from(GITIGNORE_MARKER);
    content.push('\n');
    for entry in GITIGNORE_ENTRIES {
        content.push_str(entry);
        content.push('\n');
    }
    content
}

/// Append carbio entries to existing .gitignore content
pub fn append_gitignore_entries(existing: &str) -> String {
    if existing.contains(GITIGNORE_MARKER) {
        return existing.to_string();
    }

    let mut result = existing.to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    if !result.is_empty() {
        result.push('\n');
    }
    result.push_str(&generate_gitignore_content());
    result
}

/// Validate initialization can proceed
pub fn validate_init(path: &Path, options: &InitOptions) -> Result<(), InitError> {
    if !path.exists() {
        return Err(InitError::DirectoryNotFound {
            path: path.to_path_buf(),
        });
    }

    let recipe_path = path.join(defaults::RECIPE_FILE);
    if recipe_path.exists() && !options.force {
        return Err(InitError::RecipeExists { path: recipe_path });
    }

    Ok(())
}

/// Derive project name from directory
pub fn derive_project_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_lowercase().replace(' ', "-"))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "carbio".to_string())
}

/// Write the recipe and update .gitignore
pub fn init_project(path: &Path, options: &InitOptions) -> Result<InitResult, InitError> {
    validate_init(path, options)?;

    let io_error = |path: &Path, e: std::io::Error| InitError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let project_name = derive_project_name(path);
    let recipe_path = path.join(defaults::RECIPE_FILE);
    std::fs::write(&recipe_path, generate_recipe_content(&project_name)?)
        .map_err(|e| io_error(&recipe_path, e))?;

    let gitignore_path = path.join(".gitignore");
    let existing = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path).map_err(|e| io_error(&gitignore_path, e))?
    } else {
        String::new()
    };
    let updated = append_gitignore_entries(&existing);
    let gitignore_updated = updated != existing;
    if gitignore_updated {
        std::fs::write(&gitignore_path, updated).map_err(|e| io_error(&gitignore_path, e))?;
    }

    tracing::info!("Initialized {} in {}", project_name, path.display());

    Ok(InitResult {
        recipe_path,
        gitignore_updated,
        project_name,
    })
}
