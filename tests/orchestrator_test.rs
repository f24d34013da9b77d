//! Integration tests for the build orchestrator
//!
//! Drives the library against a real package store on disk with a scripted
//! tool runner, and checks the generated descriptors, stamps and package
//! manifest.

mod common;

use std::cell::RefCell;

use carbio::core::orchestrator::{BuildContext, ContextOptions, Orchestrator, RunOptions, Stage};
use carbio::core::package::PackageManifest;
use carbio::core::recipe::Recipe;
use carbio::core::resolver::StoreResolver;
use carbio::error::{CarbioError, ConfigurationError, PackagingError, ToolFailure};
use carbio::infra::process::{Invocation, ToolRunner};
use common::{TestProject, SAMPLE_RECIPE};
use proptest::prelude::*;

/// Records invocations and fails those whose command line contains a marker
#[derive(Default)]
struct ScriptedRunner {
    calls: RefCell<Vec<String>>,
    fail_on: Option<(&'static str, i32)>,
}

impl ScriptedRunner {
    fn failing(marker: &'static str, code: i32) -> Self {
        Self {
            fail_on: Some((marker, code)),
            ..Self::default()
        }
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure> {
        let line = invocation.command_line();
        self.calls.borrow_mut().push(line.clone());
        match self.fail_on {
            Some((marker, code)) if line.contains(marker) => Err(ToolFailure {
                command: line,
                code: Some(code),
                stderr: "scripted failure".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn context(project: &TestProject) -> BuildContext {
    BuildContext::new(
        &project.path(),
        Recipe::from_toml(SAMPLE_RECIPE).unwrap(),
        ContextOptions {
            build_type: None,
            jobs: 3,
            package_dir: None,
            cmake: "cmake".to_string(),
            ctest: "ctest".to_string(),
        },
    )
}

#[test]
fn test_generated_descriptors_reflect_options_and_roles() {
    let project = TestProject::new();
    project.install_defaults();
    let resolver = StoreResolver::new(project.store_path());
    let runner = ScriptedRunner::default();
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);

    orch.generate(&mut ctx).unwrap();

    let spdlog = project.read_file("build/generators/spdlog-config.cmake");
    assert!(spdlog.contains("add_library(spdlog::spdlog INTERFACE IMPORTED)"));
    assert!(spdlog.contains("set(spdlog_HEADER_ONLY ON)"));
    assert!(spdlog.contains("SPDLOG_HEADER_ONLY"));
    assert!(spdlog.contains("SPDLOG_NO_EXCEPTIONS"));
    assert!(!spdlog.contains("SPDLOG_USE_STD_FORMAT"));
    assert!(!spdlog.contains("find_library"));

    let aggregate = project.read_file("build/generators/carbio_deps.cmake");
    assert!(aggregate.contains("set(CARBIO_LINK_LIBRARIES spdlog::spdlog)"));
    assert!(aggregate.contains("set(CARBIO_TEST_LIBRARIES gtest::gtest benchmark::benchmark)"));

    assert!(project.file_exists("build/generators/carbio_toolchain.cmake"));
    assert!(project.file_exists("build/generators/carbio-generators.lock"));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_create_then_separate_package_after_test_failure() {
    let project = TestProject::new();
    project.install_defaults();
    let resolver = StoreResolver::new(project.store_path());

    let runner = ScriptedRunner::failing("ctest", 8);
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);
    let err = orch.run_all(&mut ctx, RunOptions::default()).unwrap_err();

    assert!(matches!(err, CarbioError::Test(_)));
    assert_eq!(err.exit_code(), 8);
    assert_eq!(orch.stage(), Stage::Built);
    assert!(!runner.calls.borrow().iter().any(|c| c.contains("--install")));
    assert!(project.file_exists("build/stamps/built"));

    let runner = ScriptedRunner::default();
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);
    orch.apply_options(&mut ctx).unwrap();
    orch.declare_requirements(&mut ctx).unwrap();
    orch.restore_built(&ctx).unwrap();
    let report = orch.package(&ctx).unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("cmake --install"));
    assert_eq!(report.files, 1);

    let manifest =
        PackageManifest::from_toml(&project.read_file("package/carbio-package.toml")).unwrap();
    assert_eq!(manifest.requires, ["spdlog/1.15.3"]);
    assert!(!manifest.options.contains_key("gtest"));
}

#[test]
fn test_build_failure_never_tests_or_packages() {
    let project = TestProject::new();
    project.install_defaults();
    let resolver = StoreResolver::new(project.store_path());
    let runner = ScriptedRunner::failing("--build", 2);
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);

    let err = orch.run_all(&mut ctx, RunOptions::default()).unwrap_err();

    assert!(matches!(err, CarbioError::Build(_)));
    assert_eq!(err.tool_failure().map(|t| t.stderr.as_str()), Some("scripted failure"));
    assert_eq!(runner.calls.borrow().len(), 2);
    assert!(!project.file_exists("build/stamps/built"));

    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);
    orch.apply_options(&mut ctx).unwrap();
    orch.declare_requirements(&mut ctx).unwrap();
    assert!(matches!(
        orch.restore_built(&ctx),
        Err(CarbioError::Packaging(PackagingError::NotBuilt { .. }))
    ));
}

#[test]
fn test_missing_test_dependency_fails_configure() {
    let project = TestProject::new();
    project.install_package("spdlog", "1.15.3", None);
    project.install_package("gtest", "1.16.0", None);
    let resolver = StoreResolver::new(project.store_path());
    let runner = ScriptedRunner::default();
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);

    orch.generate(&mut ctx).unwrap();
    match orch.configure(&ctx) {
        Err(CarbioError::Configuration(ConfigurationError::Unresolved { name, version })) => {
            assert_eq!(name, "benchmark");
            assert_eq!(version, "1.9.4");
        }
        other => panic!("expected Unresolved, got {other:?}"),
    }
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_newer_compatible_version_is_selected() {
    let project = TestProject::new();
    project.install_defaults();
    project.install_package("spdlog", "1.16.0", None);
    project.install_package("spdlog", "2.0.0", None);
    let resolver = StoreResolver::new(project.store_path());
    let runner = ScriptedRunner::default();
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);

    orch.generate(&mut ctx).unwrap();

    let version = project.read_file("build/generators/spdlog-config-version.cmake");
    assert!(version.contains("set(PACKAGE_VERSION \"1.16.0\")"));
}

#[test]
fn test_edited_descriptor_fails_configure() {
    let project = TestProject::new();
    project.install_defaults();
    let resolver = StoreResolver::new(project.store_path());
    let runner = ScriptedRunner::default();
    let mut ctx = context(&project);
    let mut orch = Orchestrator::new(&runner, &resolver);

    orch.generate(&mut ctx).unwrap();
    project.create_file("build/generators/carbio_deps.cmake", "# edited\n");

    assert!(matches!(
        orch.configure(&ctx),
        Err(CarbioError::Configuration(ConfigurationError::Inconsistent { .. }))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Generation with identical inputs is byte-identical
    #[test]
    fn prop_generate_is_idempotent(jobs in 1usize..64) {
        let project = TestProject::new();
        project.install_defaults();
        let resolver = StoreResolver::new(project.store_path());
        let runner = ScriptedRunner::default();

        let mut first = context(&project);
        first.driver.jobs = jobs;
        Orchestrator::new(&runner, &resolver).generate(&mut first).unwrap();
        let lock = project.read_file("build/generators/carbio-generators.lock");
        let toolchain = project.read_file("build/generators/carbio_toolchain.cmake");

        let mut second = context(&project);
        Orchestrator::new(&runner, &resolver).generate(&mut second).unwrap();

        prop_assert_eq!(project.read_file("build/generators/carbio-generators.lock"), lock);
        prop_assert_eq!(project.read_file("build/generators/carbio_toolchain.cmake"), toolchain);
    }
}
