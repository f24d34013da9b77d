//! Global configuration management
//!
//! Reads user-wide settings from `config.toml` in the config directory:
//! the package store location, default job count and tool executables.

use crate::config::defaults;
use crate::infra::dirs::CarbioDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for carbio
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Package store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Where the dependency manager installs packages
    pub path: Option<PathBuf>,
}

/// Default build options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Default number of parallel jobs
    pub jobs: Option<usize>,
}

/// Tool executables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub cmake: Option<String>,
    pub ctest: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// A missing file yields the default configuration.
    pub fn load(dirs: &CarbioDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Effective package store: environment, then this file, then the platform default
    #[must_use]
    pub fn store_dir(&self, dirs: &CarbioDirs) -> PathBuf {
        dirs.store_override()
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(|| dirs.default_store_dir())
    }

    /// Effective job count: CLI, then this file, then the CPU count
    #[must_use]
    pub fn build_jobs(&self, cli: Option<usize>) -> usize {
        cli.or(self.build.jobs).unwrap_or_else(num_cpus::get).max(1)
    }

    /// Effective cmake executable: recipe, then this file, then `cmake`
    #[must_use]
    pub fn cmake(&self, recipe: Option<&str>) -> String {
        recipe
            .or(self.tools.cmake.as_deref())
            .unwrap_or(defaults::DEFAULT_CMAKE)
            .to_string()
    }

    /// Effective ctest executable: recipe, then this file, then `ctest`
    #[must_use]
    pub fn ctest(&self, recipe: Option<&str>) -> String {
        recipe
            .or(self.tools.ctest.as_deref())
            .unwrap_or(defaults::DEFAULT_CTEST)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = GlobalConfig::load_from_path(&temp_dir.path().join("config.toml")).unwrap();
        assert!(config.store.path.is_none());
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[store]
path = "/srv/carbio/store"

[build]
jobs = 6

[tools]
cmake = "/opt/cmake/bin/cmake"
"#,
        )
        .unwrap();

        let config = GlobalConfig::load_from_path(&config_path).unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("/srv/carbio/store")));
        assert_eq!(config.build_jobs(None), 6);
        assert_eq!(config.build_jobs(Some(2)), 2);
        assert_eq!(config.cmake(None), "/opt/cmake/bin/cmake");
        assert_eq!(config.cmake(Some("cmake3")), "cmake3");
        assert_eq!(config.ctest(None), "ctest");
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid toml [[[").unwrap();

        assert!(matches!(
            GlobalConfig::load_from_path(&config_path),
            Err(GlobalConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_jobs_never_zero() {
        let config = GlobalConfig::default();
        assert_eq!(config.build_jobs(Some(0)), 1);
    }
}
