//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// A temporary project directory plus a separate package store and config
/// directory, so tests never see the user's real store.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Package store the project resolves against
    pub store: TempDir,
    /// Global config directory and fake tools
    pub home: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            store: TempDir::new().expect("Failed to create temp store"),
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Install a package into the store, optionally with metadata
    pub fn install_package(&self, name: &str, version: &str, metadata: Option<&str>) -> PathBuf {
        let root = self.store.path().join(name).join(version);
        std::fs::create_dir_all(root.join("include")).expect("Failed to create package");
        if let Some(content) = metadata {
            std::fs::write(root.join("carbio-package.toml"), content)
                .expect("Failed to write package metadata");
        }
        root
    }

    /// Install every dependency of the default recipe
    pub fn install_defaults(&self) {
        self.install_package("spdlog", "1.15.3", Some(SPDLOG_METADATA));
        self.install_package("gtest", "1.16.0", None);
        self.install_package("benchmark", "1.9.4", None);
    }

    /// Path of the log the fake tools append to
    pub fn tool_log(&self) -> PathBuf {
        self.home.path().join("tools.log")
    }

    /// Lines of the fake tool log
    pub fn tool_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.tool_log())
            .unwrap_or_default()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    /// Write an executable shell script standing in for a tool
    #[cfg(unix)]
    pub fn fake_tool(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.home.path().join("bin").join(name);
        std::fs::create_dir_all(path.parent().expect("tool has a parent"))
            .expect("Failed to create bin dir");
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{}\"\n{body}\n",
            self.tool_log().display()
        );
        std::fs::write(&path, script).expect("Failed to write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake tool executable");
        path
    }

    /// Fake cmake that succeeds and installs a header on `--install`
    #[cfg(unix)]
    pub fn fake_cmake(&self) -> PathBuf {
        self.fake_tool("cmake", FAKE_CMAKE_BODY)
    }

    /// Fake ctest exiting with `code`
    #[cfg(unix)]
    pub fn fake_ctest(&self, code: i32) -> PathBuf {
        self.fake_tool("ctest", &format!("exit {code}"))
    }

    /// Write the default recipe with tools pointing at the given executables
    pub fn write_recipe(&self, cmake: &Path, ctest: &Path) {
        self.create_file(
            "carbio.toml",
            &format!(
                "{SAMPLE_RECIPE}\n[tools]\ncmake = \"{}\"\nctest = \"{}\"\n",
                cmake.display(),
                ctest.display()
            ),
        );
        self.create_file("CMakeLists.txt", "cmake_minimum_required(VERSION 3.23)\nproject(carbio CXX)\n");
    }

    /// Run the carbio binary in the project directory
    pub fn carbio(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_carbio"))
            .current_dir(self.dir.path())
            .args(args)
            .env("CARBIO_STORE_DIR", self.store.path())
            .env("CARBIO_CONFIG_DIR", self.home.path().join("config"))
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute carbio")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout of a command as a string
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr of a command as a string
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Fake cmake: on `--install <build> ... --prefix <dir>` drop a header into `<dir>`
pub const FAKE_CMAKE_BODY: &str = r#"if [ "$1" = "--install" ]; then
  while [ $# -gt 0 ]; do
    if [ "$1" = "--prefix" ]; then
      mkdir -p "$2/include/carbio" && touch "$2/include/carbio/carbio.hpp"
    fi
    shift
  done
fi
exit 0"#;

/// Store metadata for spdlog
pub const SPDLOG_METADATA: &str = r#"
[cpp_info]
includedirs = ["include"]
libs = ["spdlog"]
defines = ["SPDLOG_COMPILED_LIB"]

[option_defines]
header_only = "SPDLOG_HEADER_ONLY"
no_exceptions = "SPDLOG_NO_EXCEPTIONS"
use_std_fmt = "SPDLOG_USE_STD_FORMAT"
"#;

/// The Carbio recipe without a `[tools]` table
pub const SAMPLE_RECIPE: &str = r#"
[project]
name = "carbio"
version = "0.1.0"

[settings]
build_type = "Release"

[requirements]
requires = ["spdlog/1.15.3"]
test_requires = ["gtest/1.16.0", "benchmark/1.9.4"]

[options.spdlog]
no_exceptions = true
header_only = true
use_std_fmt = false

[layout]
generators = "build/generators"
package = "package"

[cmake]
ctest_args = ["--output-on-failure"]
"#;
