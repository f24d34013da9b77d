//! Generator lock file
//!
//! `carbio-generators.lock` records what generation produced: each
//! generated file with its SHA-256, how every declaration resolved, and a
//! digest of the settings, layout and options generation ran with.
//! Configure uses it to detect missing, edited or stale descriptors, and
//! the build stamps store its fingerprint.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::dependency::{Requirements, Role};
use crate::core::deps::Resolution;
use crate::error::{ConfigurationError, FilesystemError};
use crate::infra::filesystem;

/// Lock file format version
pub const LOCK_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratorLock {
    pub version: u32,

    /// Digest over every entry below
    pub fingerprint: String,

    /// Digest of the generation inputs (settings, layout, options)
    #[serde(default)]
    pub inputs: String,

    #[serde(default)]
    pub files: Vec<LockedFile>,

    #[serde(default)]
    pub dependencies: Vec<LockedDependency>,
}

/// A generated file, relative to the generators folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockedFile {
    pub path: String,
    pub sha256: String,
}

/// How a declaration resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockedDependency {
    pub name: String,
    /// Declared minimum version
    pub declared: String,
    pub role: Role,
    pub resolved: bool,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub root: Option<String>,
}

impl GeneratorLock {
    /// Build a lock from the input digest, generated `(name, content)` pairs
    /// and resolutions
    pub fn new<'a>(
        inputs: &str,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
        resolutions: &[Resolution],
    ) -> Self {
        let files: Vec<LockedFile> = files
            .into_iter()
            .map(|(path, content)| LockedFile {
                path: path.to_string(),
                sha256: filesystem::sha256_hex(content),
            })
            .collect();

        let dependencies = resolutions
            .iter()
            .map(|r| LockedDependency {
                name: r.declaration.name.clone(),
                declared: r.declaration.version.to_string(),
                role: r.declaration.role,
                resolved: r.resolved.is_some(),
                version: r.resolved.as_ref().map(|d| d.version.to_string()),
                root: r.resolved.as_ref().map(|d| d.root.display().to_string()),
            })
            .collect();

        let mut lock = Self {
            version: LOCK_VERSION,
            fingerprint: String::new(),
            inputs: inputs.to_string(),
            files,
            dependencies,
        };
        lock.fingerprint = lock.compute_fingerprint();
        lock
    }

    fn compute_fingerprint(&self) -> String {
        let mut material = format!("inputs {}\n", self.inputs);
        for file in &self.files {
            material.push_str(&format!("file {} {}\n", file.path, file.sha256));
        }
        for dep in &self.dependencies {
            material.push_str(&format!(
                "dep {} {} {} {}\n",
                dep.name,
                dep.declared,
                dep.role,
                dep.version.as_deref().unwrap_or("-")
            ));
        }
        filesystem::sha256_hex(&material)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load the lock, reporting absence as a missing descriptor
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::MissingDescriptor {
                path: path.to_path_buf(),
            });
        }
        let content = filesystem::read_file(path).map_err(|e| ConfigurationError::Inconsistent {
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| ConfigurationError::Inconsistent {
            message: format!("unreadable lock '{}': {e}", path.display()),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FilesystemError> {
        let content = self.to_toml().map_err(|e| FilesystemError::WriteFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        filesystem::write_file(path, &content)
    }

    /// Check the generators folder and declarations against this lock
    ///
    /// Fails when the outputs were generated from other inputs, when a
    /// recorded file is missing or was changed, when the declarations differ
    /// from what was generated, or when any declared dependency has no
    /// resolved artifact.
    pub fn verify(
        &self,
        generators: &Path,
        requirements: &Requirements,
        inputs: &str,
    ) -> Result<(), ConfigurationError> {
        if self.version != LOCK_VERSION {
            return Err(ConfigurationError::Inconsistent {
                message: format!("lock format {} is not supported", self.version),
            });
        }
        if self.fingerprint != self.compute_fingerprint() {
            return Err(ConfigurationError::Inconsistent {
                message: "lock fingerprint does not match its entries".to_string(),
            });
        }
        if self.inputs != inputs {
            return Err(ConfigurationError::Inconsistent {
                message: "descriptors were generated for other settings, layout or options; \
                          run 'carbio generate'"
                    .to_string(),
            });
        }

        for file in &self.files {
            let path = generators.join(&file.path);
            if !path.exists() {
                return Err(ConfigurationError::MissingDescriptor { path });
            }
            let actual = filesystem::sha256_file(&path).map_err(|e| ConfigurationError::Inconsistent {
                message: e.to_string(),
            })?;
            if actual != file.sha256 {
                return Err(ConfigurationError::Inconsistent {
                    message: format!("'{}' changed since it was generated", file.path),
                });
            }
        }

        if self.dependencies.len() != requirements.len() {
            return Err(ConfigurationError::Inconsistent {
                message: format!(
                    "descriptors cover {} dependencies but {} are declared",
                    self.dependencies.len(),
                    requirements.len()
                ),
            });
        }

        for declared in requirements.all() {
            let Some(locked) = self.dependencies.iter().find(|d| d.name == declared.name) else {
                return Err(ConfigurationError::Inconsistent {
                    message: format!("no descriptor for declared dependency '{}'", declared.name),
                });
            };
            if locked.role != declared.role || locked.declared != declared.version.to_string() {
                return Err(ConfigurationError::Inconsistent {
                    message: format!(
                        "'{}' was generated as {}/{} ({}) but is declared as {} ({})",
                        declared.name,
                        locked.name,
                        locked.declared,
                        locked.role,
                        declared.reference(),
                        declared.role
                    ),
                });
            }
            if !locked.resolved {
                return Err(ConfigurationError::Unresolved {
                    name: declared.name.clone(),
                    version: declared.version.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::DependencyDeclaration;
    use crate::core::resolver::ResolvedDependency;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn requirements() -> Requirements {
        let mut reqs = Requirements::new();
        reqs.add(DependencyDeclaration::new("spdlog/1.15.3".parse().unwrap(), Role::Build))
            .unwrap();
        reqs.add(DependencyDeclaration::new("gtest/1.16.0".parse().unwrap(), Role::Test))
            .unwrap();
        reqs
    }

    fn resolutions(reqs: &Requirements, resolve_all: bool) -> Vec<Resolution> {
        reqs.all()
            .iter()
            .enumerate()
            .map(|(i, d)| Resolution {
                declaration: d.clone(),
                resolved: (resolve_all || i == 0).then(|| ResolvedDependency {
                    name: d.name.clone(),
                    version: d.version.clone(),
                    role: d.role,
                    root: PathBuf::from(format!("/store/{}", d.name)),
                    include_dirs: vec![],
                    lib_dirs: vec![],
                    libs: vec![],
                    defines: vec![],
                    header_only: true,
                }),
            })
            .collect()
    }

    fn write_generated(dir: &Path) -> Vec<(String, String)> {
        let files = vec![
            ("carbio_toolchain.cmake".to_string(), "toolchain\n".to_string()),
            ("carbio_deps.cmake".to_string(), "deps\n".to_string()),
        ];
        for (name, content) in &files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        files
    }

    const INPUTS: &str = "inputs-digest";

    fn lock_for(files: &[(String, String)], resolutions: &[Resolution]) -> GeneratorLock {
        GeneratorLock::new(
            INPUTS,
            files.iter().map(|(n, c)| (n.as_str(), c.as_str())),
            resolutions,
        )
    }

    #[test]
    fn test_verify_accepts_fresh_generation() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, true));

        lock.verify(dir.path(), &reqs, INPUTS).unwrap();
    }

    #[test]
    fn test_verify_detects_missing_file() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, true));
        std::fs::remove_file(dir.path().join("carbio_deps.cmake")).unwrap();

        assert!(matches!(
            lock.verify(dir.path(), &reqs, INPUTS),
            Err(ConfigurationError::MissingDescriptor { .. })
        ));
    }

    #[test]
    fn test_verify_detects_edited_file() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, true));
        std::fs::write(dir.path().join("carbio_toolchain.cmake"), "edited\n").unwrap();

        assert!(matches!(
            lock.verify(dir.path(), &reqs, INPUTS),
            Err(ConfigurationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_verify_reports_unresolved_dependency() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, false));

        match lock.verify(dir.path(), &reqs, INPUTS) {
            Err(ConfigurationError::Unresolved { name, version }) => {
                assert_eq!(name, "gtest");
                assert_eq!(version, "1.16.0");
            }
            other => panic!("expected Unresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_detects_changed_declarations() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, true));

        let mut changed = Requirements::new();
        changed
            .add(DependencyDeclaration::new("spdlog/1.15.3".parse().unwrap(), Role::Build))
            .unwrap();
        changed
            .add(DependencyDeclaration::new("gtest/1.16.0".parse().unwrap(), Role::Build))
            .unwrap();

        assert!(matches!(
            lock.verify(dir.path(), &changed, INPUTS),
            Err(ConfigurationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_verify_detects_changed_inputs() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let files = write_generated(dir.path());
        let lock = lock_for(&files, &resolutions(&reqs, true));

        match lock.verify(dir.path(), &reqs, "other-inputs") {
            Err(ConfigurationError::Inconsistent { message }) => {
                assert!(message.contains("carbio generate"));
            }
            other => panic!("expected Inconsistent, got {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let reqs = requirements();
        let res = resolutions(&reqs, true);
        let a = GeneratorLock::new(INPUTS, [("a", "1")], &res);
        let b = GeneratorLock::new(INPUTS, [("a", "1")], &res);
        let c = GeneratorLock::new(INPUTS, [("a", "2")], &res);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        let d = GeneratorLock::new("other-inputs", [("a", "1")], &res);
        assert_ne!(a.fingerprint, d.fingerprint);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let reqs = requirements();
        let lock = GeneratorLock::new(INPUTS, [("a", "1")], &resolutions(&reqs, false));
        let path = dir.path().join("carbio-generators.lock");

        lock.save(&path).unwrap();
        assert_eq!(GeneratorLock::load(&path).unwrap(), lock);
    }

    #[test]
    fn test_load_missing_lock() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GeneratorLock::load(&dir.path().join("carbio-generators.lock")),
            Err(ConfigurationError::MissingDescriptor { .. })
        ));
    }
}
