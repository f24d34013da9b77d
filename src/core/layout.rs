//! Build layout
//!
//! Maps the logical folders of a build (source, generators, build, package,
//! stamps) to filesystem locations under the project root.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::recipe::Recipe;
use crate::core::settings::BuildType;
use crate::error::FilesystemError;
use crate::infra::filesystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Project root, also the CMake source folder
    pub source: PathBuf,
    /// Generator output (toolchain and dependency descriptors)
    pub generators: PathBuf,
    /// CMake binary folder
    pub build: PathBuf,
    /// Install destination
    pub package: PathBuf,
    /// Step completion markers
    pub stamps: PathBuf,
}

impl BuildLayout {
    /// Derive the layout for `root`
    ///
    /// Single-config generators get one build folder per build type, so
    /// Debug and Release trees never share a cache.
    pub fn new(root: &Path, recipe: &Recipe, build_type: BuildType) -> Self {
        let build_root = root.join(defaults::BUILD_DIR);
        let build = if recipe.cmake.is_multi_config() {
            build_root
        } else {
            build_root.join(build_type.as_str())
        };

        Self {
            source: root.to_path_buf(),
            generators: root.join(&recipe.layout.generators),
            build,
            package: root.join(&recipe.layout.package),
            stamps: root.join(defaults::STAMPS_DIR),
        }
    }

    /// Override the install destination
    #[must_use]
    pub fn with_package_dir(mut self, package: PathBuf) -> Self {
        self.package = package;
        self
    }

    pub fn toolchain_file(&self) -> PathBuf {
        self.generators.join(defaults::TOOLCHAIN_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.generators.join(defaults::GENERATORS_LOCK)
    }

    pub fn package_manifest(&self) -> PathBuf {
        self.package.join(defaults::PACKAGE_MANIFEST)
    }

    pub fn stamp(&self, name: &str) -> PathBuf {
        self.stamps.join(name)
    }

    /// Create the generators folder so generation can write into it
    pub fn ensure_generators(&self) -> Result<(), FilesystemError> {
        filesystem::create_dir_all(&self.generators)
    }
}
