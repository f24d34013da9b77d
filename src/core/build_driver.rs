//! Build driver invocations
//!
//! Constructs the CMake and CTest command lines for the configure, build,
//! test and install phases. Nothing here runs a process.

use crate::core::layout::BuildLayout;
use crate::core::recipe::CmakeConfig;
use crate::core::settings::BuildType;
use crate::core::toolchain::cmake_path;
use crate::infra::process::Invocation;

/// Everything needed to drive CMake for one build tree
#[derive(Debug, Clone)]
pub struct BuildDriver {
    pub cmake: String,
    pub ctest: String,
    pub config: CmakeConfig,
    pub build_type: BuildType,
    pub jobs: usize,
}

impl BuildDriver {
    fn multi_config(&self) -> bool {
        self.config.is_multi_config()
    }

    /// `cmake -S <source> -B <build> ...`
    pub fn configure(&self, layout: &BuildLayout) -> Invocation {
        let mut inv = Invocation::new(&self.cmake)
            .args(["-S".to_string(), cmake_path(&layout.source)])
            .args(["-B".to_string(), cmake_path(&layout.build)]);

        if let Some(generator) = &self.config.generator {
            inv = inv.args(["-G", generator.as_str()]);
        }

        inv = inv
            .arg(format!(
                "-DCMAKE_TOOLCHAIN_FILE={}",
                cmake_path(&layout.toolchain_file())
            ))
            .arg(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                cmake_path(&layout.package)
            ))
            .arg("-DCMAKE_POLICY_DEFAULT_CMP0091=NEW");

        if !self.multi_config() {
            inv = inv.arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        }

        for (key, value) in &self.config.definitions {
            inv = inv.arg(format!("-D{key}={value}"));
        }

        inv
    }

    /// `cmake --build <build> [--config <bt>] --parallel <jobs>`
    pub fn build(&self, layout: &BuildLayout) -> Invocation {
        let mut inv = Invocation::new(&self.cmake).args(["--build".to_string(), cmake_path(&layout.build)]);
        if self.multi_config() {
            inv = inv.args(["--config", self.build_type.as_str()]);
        }
        inv.args(["--parallel".to_string(), self.jobs.to_string()])
    }

    /// `ctest --build-config <bt> --parallel <jobs> <ctest_args>`, run in the build folder
    pub fn test(&self, layout: &BuildLayout) -> Invocation {
        Invocation::new(&self.ctest)
            .args(["--build-config", self.build_type.as_str()])
            .args(["--parallel".to_string(), self.jobs.to_string()])
            .args(self.config.ctest_args.iter().cloned())
            .current_dir(layout.build.clone())
    }

    /// `cmake --install <build> [--config <bt>] --prefix <package>`
    pub fn install(&self, layout: &BuildLayout) -> Invocation {
        let mut inv = Invocation::new(&self.cmake).args(["--install".to_string(), cmake_path(&layout.build)]);
        if self.multi_config() {
            inv = inv.args(["--config", self.build_type.as_str()]);
        }
        inv.args(["--prefix".to_string(), cmake_path(&layout.package)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recipe::Recipe;
    use std::path::Path;

    fn driver(recipe: &Recipe) -> (BuildDriver, BuildLayout) {
        let layout = BuildLayout::new(Path::new("/w"), recipe, BuildType::Release);
        let driver = BuildDriver {
            cmake: "cmake".to_string(),
            ctest: "ctest".to_string(),
            config: recipe.cmake.clone(),
            build_type: BuildType::Release,
            jobs: 4,
        };
        (driver, layout)
    }

    #[test]
    fn test_configure_single_config() {
        let mut recipe = Recipe::carbio_default();
        recipe
            .cmake
            .definitions
            .insert("CARBIO_BUILD_BENCHMARKS".to_string(), "ON".to_string());
        let (driver, layout) = driver(&recipe);

        assert_eq!(
            driver.configure(&layout).args,
            [
                "-S",
                "/w",
                "-B",
                "/w/build/Release",
                "-DCMAKE_TOOLCHAIN_FILE=/w/build/generators/carbio_toolchain.cmake",
                "-DCMAKE_INSTALL_PREFIX=/w/package",
                "-DCMAKE_POLICY_DEFAULT_CMP0091=NEW",
                "-DCMAKE_BUILD_TYPE=Release",
                "-DCARBIO_BUILD_BENCHMARKS=ON",
            ]
        );
    }

    #[test]
    fn test_multi_config_passes_config_at_build_time() {
        let mut recipe = Recipe::carbio_default();
        recipe.cmake.generator = Some("Ninja Multi-Config".to_string());
        let (driver, layout) = driver(&recipe);

        let configure = driver.configure(&layout);
        assert!(configure.args.contains(&"Ninja Multi-Config".to_string()));
        assert!(!configure.args.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE")));

        assert_eq!(
            driver.build(&layout).args,
            ["--build", "/w/build", "--config", "Release", "--parallel", "4"]
        );
        assert_eq!(
            driver.install(&layout).args,
            ["--install", "/w/build", "--config", "Release", "--prefix", "/w/package"]
        );
    }

    #[test]
    fn test_ctest_runs_in_build_folder_with_failure_output() {
        let recipe = Recipe::carbio_default();
        let (driver, layout) = driver(&recipe);
        let test = driver.test(&layout);

        assert_eq!(test.program, "ctest");
        assert_eq!(test.cwd.as_deref(), Some(Path::new("/w/build/Release")));
        assert_eq!(
            test.args,
            ["--build-config", "Release", "--parallel", "4", "--output-on-failure"]
        );
    }
}
