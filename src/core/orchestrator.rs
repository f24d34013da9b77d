//! Build orchestration
//!
//! Drives a build through its stages in a fixed order:
//!
//! ```text
//! Idle -> OptionsApplied -> RequirementsDeclared -> ToolchainGenerated
//!      -> DependenciesGenerated -> Configured -> Built -> Tested -> Packaged
//! ```
//!
//! Each step checks the current stage, does its work, and advances. A failed
//! step leaves the stage where it was. Configure and Build record their
//! success as stamps holding the generator lock fingerprint, so later
//! invocations (`carbio package` after `carbio build`) can resume from disk.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::build_driver::BuildDriver;
use crate::core::dependency::Requirements;
use crate::core::deps::{self, GeneratedFile, Resolution};
use crate::core::layout::BuildLayout;
use crate::core::lock::GeneratorLock;
use crate::core::options::OptionSet;
use crate::core::package::{self, PackageManifest, PackageReport};
use crate::core::recipe::Recipe;
use crate::core::resolver::DependencyResolver;
use crate::core::settings::{BuildType, Settings};
use crate::core::toolchain;
use crate::error::{
    BuildError, CarbioError, ConfigurationError, PackagingError, StageError, TestFailure,
};
use crate::infra::filesystem;
use crate::infra::process::ToolRunner;

/// Stamp written after a successful configure
pub const CONFIGURED_STAMP: &str = "configured";

/// Stamp written after a successful build
pub const BUILT_STAMP: &str = "built";

/// Position of a build in the stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    OptionsApplied,
    RequirementsDeclared,
    ToolchainGenerated,
    DependenciesGenerated,
    Configured,
    Built,
    Tested,
    Packaged,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OptionsApplied => "options-applied",
            Self::RequirementsDeclared => "requirements-declared",
            Self::ToolchainGenerated => "toolchain-generated",
            Self::DependenciesGenerated => "dependencies-generated",
            Self::Configured => "configured",
            Self::Built => "built",
            Self::Tested => "tested",
            Self::Packaged => "packaged",
        };
        write!(f, "{name}")
    }
}

/// Knobs that do not live in the recipe
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub build_type: Option<BuildType>,
    pub jobs: usize,
    pub package_dir: Option<PathBuf>,
    pub cmake: String,
    pub ctest: String,
}

/// Mutable configuration shared by every step of one build
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub recipe: Recipe,
    pub settings: Settings,
    pub layout: BuildLayout,
    pub options: OptionSet,
    pub requirements: Requirements,
    pub driver: BuildDriver,
}

impl BuildContext {
    pub fn new(root: &Path, recipe: Recipe, opts: ContextOptions) -> Self {
        let settings = Settings::resolve(&recipe.settings, opts.build_type);
        let mut layout = BuildLayout::new(root, &recipe, settings.build_type);
        if let Some(dir) = opts.package_dir {
            let dir = if dir.is_absolute() { dir } else { root.join(dir) };
            layout = layout.with_package_dir(dir);
        }

        let driver = BuildDriver {
            cmake: opts.cmake,
            ctest: opts.ctest,
            config: recipe.cmake.clone(),
            build_type: settings.build_type,
            jobs: opts.jobs.max(1),
        };

        Self {
            options: recipe.option_set(),
            requirements: Requirements::new(),
            recipe,
            settings,
            layout,
            driver,
        }
    }

    /// Digest of everything generation depends on besides the resolutions:
    /// settings, toolchain layout, build folder and the option set
    pub fn input_digest(&self) -> String {
        let mut material =
            toolchain::render_toolchain(&self.settings, &self.layout, &self.recipe.cmake);
        material.push_str(&format!("build {}\n", self.layout.build.display()));
        material.push_str(&self.options.canonical());
        filesystem::sha256_hex(&material)
    }
}

/// Steps `run_all` should perform
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_tests: bool,
}

/// Drives one build through its stages
pub struct Orchestrator<'a> {
    runner: &'a dyn ToolRunner,
    resolver: &'a dyn DependencyResolver,
    stage: Stage,
    toolchain: Option<GeneratedFile>,
    fingerprint: Option<String>,
    unresolved: Vec<String>,
    observer: Option<&'a dyn Fn(Stage)>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(runner: &'a dyn ToolRunner, resolver: &'a dyn DependencyResolver) -> Self {
        Self {
            runner,
            resolver,
            stage: Stage::Idle,
            toolchain: None,
            fingerprint: None,
            unresolved: Vec::new(),
            observer: None,
        }
    }

    /// Called with the new stage after every successful step
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn Fn(Stage)) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Fingerprint of the generated outputs this build is working from
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Declarations the last generation could not resolve, as `name/version`
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    fn expect(&self, step: &'static str, expected: Stage) -> Result<(), StageError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(StageError::OutOfOrder {
                step,
                expected,
                actual: self.stage,
            })
        }
    }

    fn advance(&mut self, stage: Stage) -> Stage {
        tracing::debug!("Stage {} -> {stage}", self.stage);
        self.stage = stage;
        if let Some(observer) = self.observer {
            observer(stage);
        }
        stage
    }

    fn current_fingerprint(&self) -> &str {
        self.fingerprint.as_deref().unwrap_or_default()
    }

    /// Idle -> OptionsApplied
    pub fn apply_options(&mut self, ctx: &mut BuildContext) -> Result<Stage, CarbioError> {
        self.expect("apply options", Stage::Idle)?;
        ctx.options.apply()?;
        Ok(self.advance(Stage::OptionsApplied))
    }

    /// OptionsApplied -> RequirementsDeclared; freezes the requirement set
    pub fn declare_requirements(&mut self, ctx: &mut BuildContext) -> Result<Stage, CarbioError> {
        self.expect("declare requirements", Stage::OptionsApplied)?;
        ctx.recipe.declare_into(&mut ctx.requirements)?;
        ctx.options.check_targets(&ctx.requirements)?;
        ctx.requirements.freeze();
        tracing::info!(
            "Declared {} requirement(s): {} build-time, {} test-only",
            ctx.requirements.len(),
            ctx.requirements.link_set().count(),
            ctx.requirements.test_set().count()
        );
        Ok(self.advance(Stage::RequirementsDeclared))
    }

    /// RequirementsDeclared -> ToolchainGenerated
    pub fn generate_toolchain(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("generate toolchain", Stage::RequirementsDeclared)?;
        ctx.layout.ensure_generators()?;

        let content = toolchain::render_toolchain(&ctx.settings, &ctx.layout, &ctx.recipe.cmake);
        filesystem::write_file(&ctx.layout.toolchain_file(), &content)?;
        tracing::info!("Wrote {}", ctx.layout.toolchain_file().display());

        self.toolchain = Some(GeneratedFile {
            name: crate::config::defaults::TOOLCHAIN_FILE.to_string(),
            content,
        });
        Ok(self.advance(Stage::ToolchainGenerated))
    }

    /// ToolchainGenerated -> DependenciesGenerated
    ///
    /// Resolves every declaration, writes one descriptor per dependency plus
    /// the aggregate, and records everything in the generator lock.
    /// Unresolved dependencies only warn here; configure refuses them.
    pub fn generate_dependencies(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("generate dependencies", Stage::ToolchainGenerated)?;

        let mut resolutions = Vec::with_capacity(ctx.requirements.len());
        for declaration in ctx.requirements.all() {
            let resolved = self
                .resolver
                .resolve(declaration, &ctx.options.for_package(&declaration.name))?;
            match &resolved {
                Some(dep) => tracing::info!(
                    "Resolved {} -> {} ({})",
                    declaration.reference(),
                    dep.version,
                    dep.root.display()
                ),
                None => tracing::warn!(
                    "No installed artifact for {}; configure will fail until it is installed",
                    declaration.reference()
                ),
            }
            resolutions.push(Resolution {
                declaration: declaration.clone(),
                resolved,
            });
        }

        let descriptors = deps::render_descriptors(&ctx.requirements, &resolutions, &ctx.options);
        for file in &descriptors {
            filesystem::write_file(&ctx.layout.generators.join(&file.name), &file.content)?;
        }
        for name in deps::stale_files(&resolutions) {
            filesystem::remove_file(&ctx.layout.generators.join(name))?;
        }

        let lock = GeneratorLock::new(
            &ctx.input_digest(),
            self.toolchain
                .iter()
                .chain(descriptors.iter())
                .map(|f| (f.name.as_str(), f.content.as_str())),
            &resolutions,
        );
        lock.save(&ctx.layout.lock_file())?;
        tracing::info!(
            "Wrote {} descriptor file(s) to {}",
            descriptors.len(),
            ctx.layout.generators.display()
        );

        self.unresolved = resolutions
            .iter()
            .filter(|r| r.resolved.is_none())
            .map(|r| r.declaration.reference())
            .collect();
        self.fingerprint = Some(lock.fingerprint);
        Ok(self.advance(Stage::DependenciesGenerated))
    }

    /// RequirementsDeclared -> DependenciesGenerated from outputs on disk
    ///
    /// The outputs are not checked here; configure verifies them.
    pub fn restore_generated(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("restore generated outputs", Stage::RequirementsDeclared)?;
        if let Ok(lock) = GeneratorLock::load(&ctx.layout.lock_file()) {
            self.fingerprint = Some(lock.fingerprint);
        }
        Ok(self.advance(Stage::DependenciesGenerated))
    }

    /// RequirementsDeclared -> Built when the build tree matches the
    /// current generated outputs
    pub fn restore_built(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("restore build", Stage::RequirementsDeclared)?;
        let not_built = || PackagingError::NotBuilt {
            build_dir: ctx.layout.build.clone(),
        };

        let lock = GeneratorLock::load(&ctx.layout.lock_file()).map_err(|_| not_built())?;
        let stamp = ctx.layout.stamp(BUILT_STAMP);
        let recorded = filesystem::read_file(&stamp).map_err(|_| not_built())?;
        if recorded.trim() != lock.fingerprint || lock.inputs != ctx.input_digest() {
            tracing::debug!("Stale build stamp {}", stamp.display());
            return Err(not_built().into());
        }

        self.fingerprint = Some(lock.fingerprint);
        Ok(self.advance(Stage::Built))
    }

    /// DependenciesGenerated -> Configured
    pub fn configure(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("configure", Stage::DependenciesGenerated)?;

        let lock = GeneratorLock::load(&ctx.layout.lock_file())?;
        lock.verify(&ctx.layout.generators, &ctx.requirements, &ctx.input_digest())?;

        filesystem::remove_file(&ctx.layout.stamp(CONFIGURED_STAMP))?;
        filesystem::remove_file(&ctx.layout.stamp(BUILT_STAMP))?;

        let invocation = ctx.driver.configure(&ctx.layout);
        tracing::info!("Configuring: {}", invocation.command_line());
        self.runner.run(&invocation).map_err(ConfigurationError::Tool)?;

        filesystem::write_file(&ctx.layout.stamp(CONFIGURED_STAMP), &lock.fingerprint)?;
        self.fingerprint = Some(lock.fingerprint);
        Ok(self.advance(Stage::Configured))
    }

    /// Configured -> Built
    pub fn build(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("build", Stage::Configured)?;
        filesystem::remove_file(&ctx.layout.stamp(BUILT_STAMP))?;

        let invocation = ctx.driver.build(&ctx.layout);
        tracing::info!("Building: {}", invocation.command_line());
        self.runner.run(&invocation).map_err(BuildError::Tool)?;

        filesystem::write_file(&ctx.layout.stamp(BUILT_STAMP), self.current_fingerprint())?;
        Ok(self.advance(Stage::Built))
    }

    /// Built -> Tested; a failure leaves the build at Built
    pub fn test(&mut self, ctx: &BuildContext) -> Result<Stage, CarbioError> {
        self.expect("test", Stage::Built)?;

        let invocation = ctx.driver.test(&ctx.layout);
        tracing::info!("Testing: {}", invocation.command_line());
        self.runner.run(&invocation).map_err(TestFailure::Tool)?;

        Ok(self.advance(Stage::Tested))
    }

    /// Built or Tested -> Packaged
    ///
    /// Installs from the existing build tree and writes the package manifest.
    /// Never configures or builds.
    pub fn package(&mut self, ctx: &BuildContext) -> Result<PackageReport, CarbioError> {
        if !matches!(self.stage, Stage::Built | Stage::Tested) {
            return Err(StageError::OutOfOrder {
                step: "package",
                expected: Stage::Built,
                actual: self.stage,
            }
            .into());
        }

        let invocation = ctx.driver.install(&ctx.layout);
        tracing::info!("Installing: {}", invocation.command_line());
        self.runner.run(&invocation).map_err(PackagingError::Tool)?;

        PackageManifest::new(&ctx.recipe.project, &ctx.settings, &ctx.requirements, &ctx.options)
            .save(&ctx.layout.package_manifest())?;

        let report = PackageReport {
            name: ctx.recipe.project.name.clone(),
            version: ctx.recipe.project.version.clone(),
            package_dir: ctx.layout.package.display().to_string(),
            files: package::count_files(&ctx.layout.package),
        };
        tracing::info!("Packaged {} file(s) into {}", report.files, report.package_dir);

        self.advance(Stage::Packaged);
        Ok(report)
    }

    /// Options through dependency descriptors (`carbio generate`)
    pub fn generate(&mut self, ctx: &mut BuildContext) -> Result<Stage, CarbioError> {
        self.apply_options(ctx)?;
        self.declare_requirements(ctx)?;
        self.generate_toolchain(ctx)?;
        self.generate_dependencies(ctx)
    }

    /// The whole sequence, stopping at the first failure
    ///
    /// Returns the package report; tests are skipped when asked.
    pub fn run_all(
        &mut self,
        ctx: &mut BuildContext,
        run: RunOptions,
    ) -> Result<PackageReport, CarbioError> {
        self.generate(ctx)?;
        self.configure(ctx)?;
        self.build(ctx)?;
        if run.skip_tests {
            tracing::info!("Skipping tests");
        } else {
            self.test(ctx)?;
        }
        self.package(ctx)
    }
}
