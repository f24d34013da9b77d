//! Clean logic
//!
//! Removes the build folder (generators and stamps included) and the
//! package folder.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::recipe::Recipe;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<PathBuf>,
    /// Directories that didn't exist
    pub skipped: Vec<PathBuf>,
}

/// Folders `clean` removes for a project
///
/// The project root and its ancestors are never targets, whatever the
/// recipe layout says.
pub fn clean_targets(root: &Path, recipe: Option<&Recipe>) -> Vec<PathBuf> {
    let package = recipe.map_or(defaults::PACKAGE_DIR, |r| r.layout.package.as_str());
    let mut targets = vec![root.join(defaults::BUILD_DIR), root.join(package)];

    // A generators folder moved outside build/ is removed too
    if let Some(recipe) = recipe {
        let generators = root.join(&recipe.layout.generators);
        if !generators.starts_with(&targets[0]) {
            targets.push(generators);
        }
    }

    let root = filesystem::normalize_lexically(root);
    targets.retain(|target| {
        let contains_root = root.starts_with(filesystem::normalize_lexically(target));
        if contains_root {
            tracing::warn!("Not removing {}: it contains the project", target.display());
        }
        !contains_root
    });
    targets
}

/// Clean build artifacts from a project
pub fn clean_project(root: &Path, recipe: Option<&Recipe>) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    for dir in clean_targets(root, recipe) {
        if dir.exists() {
            filesystem::remove_dir_all(&dir)?;
            tracing::info!("Removed {}", dir.display());
            result.removed.push(dir);
        } else {
            result.skipped.push(dir);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_build_and_package() {
        let project = TempDir::new().unwrap();
        let generators = project.path().join("build/generators");
        std::fs::create_dir_all(&generators).unwrap();
        std::fs::write(generators.join("carbio_deps.cmake"), "").unwrap();
        std::fs::create_dir_all(project.path().join("package/include")).unwrap();

        let result = clean_project(project.path(), Some(&Recipe::carbio_default())).unwrap();

        assert!(!project.path().join("build").exists());
        assert!(!project.path().join("package").exists());
        assert_eq!(result.removed.len(), 2);
    }

    #[test]
    fn test_clean_uses_recipe_layout() {
        let project = TempDir::new().unwrap();
        let mut recipe = Recipe::carbio_default();
        recipe.layout.package = "dist".to_string();
        recipe.layout.generators = "gen".to_string();
        std::fs::create_dir_all(project.path().join("dist")).unwrap();
        std::fs::create_dir_all(project.path().join("gen")).unwrap();

        let result = clean_project(project.path(), Some(&recipe)).unwrap();

        assert!(!project.path().join("dist").exists());
        assert!(!project.path().join("gen").exists());
        assert_eq!(result.removed.len(), 2);
        assert_eq!(result.skipped, [project.path().join("build")]);
    }

    #[test]
    fn test_clean_never_removes_project_root() {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("main.cpp"), "int main() {}\n").unwrap();
        std::fs::create_dir_all(project.path().join("build")).unwrap();

        for package in [".", "", "..", "./"] {
            let mut recipe = Recipe::carbio_default();
            recipe.layout.package = package.to_string();

            let targets = clean_targets(project.path(), Some(&recipe));
            assert_eq!(targets, [project.path().join("build")], "package = {package:?}");

            clean_project(project.path(), Some(&recipe)).unwrap();
            assert!(project.path().join("main.cpp").exists());
        }
    }

    #[test]
    fn test_clean_succeeds_when_no_artifacts() {
        let project = TempDir::new().unwrap();
        let result = clean_project(project.path(), None).unwrap();
        assert!(result.removed.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }
}
