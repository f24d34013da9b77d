//! Package manifest
//!
//! `carbio-package.toml` is written next to the installed artifact. It
//! describes what a consumer links against: project identity, the settings
//! the artifact was built with, and the build-time requirements with their
//! options. Test-only dependencies never appear here. The `[cpp_info]`
//! table uses the store metadata format, so an installed package can be
//! dropped into a package store and consumed by another recipe.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::core::dependency::Requirements;
use crate::core::options::{OptionSet, PackageOptions};
use crate::core::recipe::ProjectConfig;
use crate::core::resolver::CppInfo;
use crate::core::settings::Settings;
use crate::error::PackagingError;
use crate::infra::filesystem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageManifest {
    /// Build-time requirements as `name/version`
    #[serde(default)]
    pub requires: Vec<String>,

    pub package: PackageInfo,
    pub settings: ManifestSettings,

    /// Options of the build-time requirements
    #[serde(default)]
    pub options: BTreeMap<String, PackageOptions>,

    #[serde(default)]
    pub cpp_info: CppInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestSettings {
    pub os: String,
    pub arch: String,
    pub build_type: String,

    #[serde(default)]
    pub compiler: Option<String>,

    #[serde(default)]
    pub cppstd: Option<String>,
}

impl PackageManifest {
    pub fn new(
        project: &ProjectConfig,
        settings: &Settings,
        requirements: &Requirements,
        options: &OptionSet,
    ) -> Self {
        let requires = requirements.link_set().map(|d| d.reference()).collect();
        let link_options = requirements
            .link_set()
            .filter_map(|d| {
                let opts = options.for_package(&d.name);
                (!opts.is_empty()).then(|| (d.name.clone(), opts))
            })
            .collect();

        Self {
            requires,
            package: PackageInfo {
                name: project.name.clone(),
                version: project.version.clone(),
            },
            settings: ManifestSettings {
                os: settings.os.clone(),
                arch: settings.arch.clone(),
                build_type: settings.build_type.to_string(),
                compiler: settings.compiler.as_ref().map(|c| match &c.version {
                    Some(version) => format!("{} {version}", c.name),
                    None => c.name.clone(),
                }),
                cppstd: settings.compiler.as_ref().and_then(|c| c.cppstd.clone()),
            },
            options: link_options,
            cpp_info: CppInfo::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn save(&self, path: &Path) -> Result<(), PackagingError> {
        let content = self.to_toml().map_err(|e| PackagingError::Manifest {
            error: e.to_string(),
        })?;
        filesystem::write_file(path, &content).map_err(|e| PackagingError::Manifest {
            error: e.to_string(),
        })
    }
}

/// Outcome of a package step
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub version: String,
    pub package_dir: String,
    /// Regular files under the package folder, manifest included
    pub files: usize,
}

/// Count regular files below `dir`
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}
