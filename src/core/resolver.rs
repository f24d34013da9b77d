//! Dependency resolution
//!
//! Resolution is delegated: an external dependency manager installs
//! packages into a local store laid out as `<store>/<name>/<version>/`.
//! This module only locates those installs and reads the metadata needed to
//! describe them to CMake. It never fetches or builds anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::dependency::{parse_version, DependencyDeclaration, Role};
use crate::core::options::{is_truthy, PackageOptions, HEADER_ONLY};
use crate::error::ResolveError;

/// A declaration matched to an installed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    /// Installed version (may be newer than the declared minimum)
    pub version: semver::Version,
    pub role: Role,
    /// Install root in the store
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub defines: Vec<String>,
    pub header_only: bool,
}

/// Something that can locate installed dependency artifacts
pub trait DependencyResolver {
    /// Find an artifact for `declaration`; `Ok(None)` when none is installed
    fn resolve(
        &self,
        declaration: &DependencyDeclaration,
        options: &PackageOptions,
    ) -> Result<Option<ResolvedDependency>, ResolveError>;
}

/// `carbio-package.toml` shipped inside an installed package
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackageMetadata {
    #[serde(default)]
    pub cpp_info: CppInfo,

    /// Option name -> preprocessor definition added when the option is on
    #[serde(default)]
    pub option_defines: BTreeMap<String, String>,
}

/// How consumers compile and link against a package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CppInfo {
    #[serde(default = "default_includedirs")]
    pub includedirs: Vec<String>,

    #[serde(default = "default_libdirs")]
    pub libdirs: Vec<String>,

    /// Library names; defaults to the package name
    #[serde(default)]
    pub libs: Option<Vec<String>>,

    #[serde(default)]
    pub defines: Vec<String>,

    /// The package never ships a library
    #[serde(default)]
    pub header_only: bool,
}

fn default_includedirs() -> Vec<String> {
    vec!["include".to_string()]
}

fn default_libdirs() -> Vec<String> {
    vec!["lib".to_string()]
}

impl Default for CppInfo {
    fn default() -> Self {
        Self {
            includedirs: default_includedirs(),
            libdirs: default_libdirs(),
            libs: None,
            defines: Vec::new(),
            header_only: false,
        }
    }
}

/// Resolver backed by the local package store
#[derive(Debug, Clone)]
pub struct StoreResolver {
    root: PathBuf,
}

impl StoreResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Highest installed version that satisfies `minimum` without crossing a major
    pub fn select_version(&self, name: &str, minimum: &semver::Version) -> Result<Option<semver::Version>, ResolveError> {
        let package_dir = self.root.join(name);
        if !package_dir.is_dir() {
            return Ok(None);
        }

        let entries = std::fs::read_dir(&package_dir).map_err(|e| ResolveError::Store {
            path: package_dir.clone(),
            error: e.to_string(),
        })?;

        let best = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().and_then(parse_version))
            .filter(|v| v >= minimum && v.major == minimum.major)
            .max();

        Ok(best)
    }

    fn load_metadata(path: &Path) -> Result<PackageMetadata, ResolveError> {
        if !path.exists() {
            return Ok(PackageMetadata::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ResolveError::Metadata {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ResolveError::Metadata {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

impl DependencyResolver for StoreResolver {
    fn resolve(
        &self,
        declaration: &DependencyDeclaration,
        options: &PackageOptions,
    ) -> Result<Option<ResolvedDependency>, ResolveError> {
        let Some(version) = self.select_version(&declaration.name, &declaration.version)? else {
            tracing::debug!(
                "No install of {} satisfying >= {} in {}",
                declaration.name,
                declaration.version,
                self.root.display()
            );
            return Ok(None);
        };

        // Directory names may use the two-component form
        let root = find_version_dir(&self.root.join(&declaration.name), &version);
        let metadata = Self::load_metadata(&root.join(defaults::PACKAGE_MANIFEST))?;
        let info = metadata.cpp_info;

        let header_only = info.header_only || is_truthy(options.get(HEADER_ONLY));

        let mut defines = info.defines.clone();
        for (option, define) in &metadata.option_defines {
            if is_truthy(options.get(option)) {
                defines.push(define.clone());
            }
        }

        let (lib_dirs, libs) = if header_only {
            (Vec::new(), Vec::new())
        } else {
            (
                info.libdirs.iter().map(|d| root.join(d)).collect(),
                info.libs
                    .clone()
                    .unwrap_or_else(|| vec![declaration.name.clone()]),
            )
        };

        tracing::debug!("Resolved {} to {version} at {}", declaration.name, root.display());

        Ok(Some(ResolvedDependency {
            name: declaration.name.clone(),
            version,
            role: declaration.role,
            include_dirs: info.includedirs.iter().map(|d| root.join(d)).collect(),
            lib_dirs,
            libs,
            defines,
            header_only,
            root,
        }))
    }
}

fn find_version_dir(package_dir: &Path, version: &semver::Version) -> PathBuf {
    let full = package_dir.join(version.to_string());
    if full.is_dir() || version.patch != 0 {
        return full;
    }
    let short = package_dir.join(format!("{}.{}", version.major, version.minor));
    if short.is_dir() {
        short
    } else {
        full
    }
}
