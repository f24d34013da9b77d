//! Platform-specific directory management
//!
//! Provides platform-specific paths for the config directory and the local
//! package store that the external dependency manager populates.
//!
//! Environment variables can override default directories:
//! - `CARBIO_CONFIG_DIR` - Override config directory
//! - `CARBIO_STORE_DIR` - Override package store directory

use std::env;
use std::path::PathBuf;

/// Environment variable names for directory overrides
pub const ENV_CONFIG_DIR: &str = "CARBIO_CONFIG_DIR";
pub const ENV_STORE_DIR: &str = "CARBIO_STORE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "carbio";

const STORE_SUBDIR: &str = "store";

/// Platform-specific directory provider for carbio
#[derive(Debug, Clone)]
pub struct CarbioDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    store_override: Option<PathBuf>,
}

impl CarbioDirs {
    /// Create a new `CarbioDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: env::var_os(ENV_CONFIG_DIR)
                .map_or_else(Self::platform_config_dir, PathBuf::from),
            data_dir: Self::platform_data_dir(),
            store_override: env::var_os(ENV_STORE_DIR).map(PathBuf::from),
        }
    }

    /// Get the config directory path
    /// - Linux: `$XDG_CONFIG_HOME/carbio` or `~/.config/carbio`
    /// - macOS: `~/Library/Application Support/carbio`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Package store set through the environment, if any
    #[must_use]
    pub fn store_override(&self) -> Option<PathBuf> {
        self.store_override.clone()
    }

    /// Default package store location under the data directory
    #[must_use]
    pub fn default_store_dir(&self) -> PathBuf {
        self.data_dir.join(STORE_SUBDIR)
    }

    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }

    fn platform_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".local").join("share").join(APP_NAME))
                    .unwrap_or_else(|| {
                        PathBuf::from(".")
                            .join(".local")
                            .join("share")
                            .join(APP_NAME)
                    })
            })
    }
}

impl Default for CarbioDirs {
    fn default() -> Self {
        Self::new()
    }
}
