//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod create;
pub mod doctor;
pub mod generate;
pub mod info;
pub mod init;
pub mod package;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::cli::output::{is_json, is_quiet, print_success};
use crate::config::defaults;
use crate::core::global_config::GlobalConfig;
use crate::core::orchestrator::{BuildContext, ContextOptions, Stage};
use crate::core::recipe::Recipe;
use crate::core::resolver::StoreResolver;
use crate::core::settings::BuildType;
use crate::infra::dirs::CarbioDirs;
use crate::infra::process::SystemRunner;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default carbio.toml recipe
    Init {
        /// Overwrite an existing recipe
        #[arg(short, long)]
        force: bool,
    },

    /// Generate the toolchain and dependency descriptors
    Generate {
        /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
        #[arg(long)]
        build_type: Option<BuildType>,
    },

    /// Configure, build and test from generated descriptors
    Build {
        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Do not run the test suite
        #[arg(long)]
        skip_tests: bool,

        /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
        #[arg(long)]
        build_type: Option<BuildType>,
    },

    /// Install the built artifact into the package folder
    Package {
        /// Package folder (defaults to the recipe layout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
        #[arg(long)]
        build_type: Option<BuildType>,
    },

    /// Generate, configure, build, test and package in one run
    Create {
        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Do not run the test suite
        #[arg(long)]
        skip_tests: bool,

        /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
        #[arg(long)]
        build_type: Option<BuildType>,

        /// Package folder (defaults to the recipe layout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show declarations, options and layout
    Info,

    /// Remove build and package folders
    Clean,

    /// Check system dependencies
    Doctor,
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        let current_dir = std::env::current_dir()?;
        match self {
            Self::Init { force } => init::execute(&current_dir, force).await,
            Self::Generate { build_type } => {
                let overrides = Overrides {
                    build_type,
                    ..Overrides::default()
                };
                generate::execute(&current_dir, overrides).await
            }
            Self::Build {
                jobs,
                skip_tests,
                build_type,
            } => {
                let overrides = Overrides {
                    jobs,
                    build_type,
                    output: None,
                };
                build::execute(&current_dir, overrides, skip_tests).await
            }
            Self::Package { output, build_type } => {
                let overrides = Overrides {
                    build_type,
                    output,
                    ..Overrides::default()
                };
                package::execute(&current_dir, overrides).await
            }
            Self::Create {
                jobs,
                skip_tests,
                build_type,
                output,
            } => {
                let overrides = Overrides {
                    jobs,
                    build_type,
                    output,
                };
                create::execute(&current_dir, overrides, skip_tests).await
            }
            Self::Info => info::execute(&current_dir).await,
            Self::Clean => clean::execute(&current_dir).await,
            Self::Doctor => doctor::execute(&current_dir).await,
        }
    }
}

/// Command-line values that take precedence over the recipe and global config
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub jobs: Option<usize>,
    pub build_type: Option<BuildType>,
    pub output: Option<PathBuf>,
}

/// Everything a command needs to drive the orchestrator
pub struct Project {
    pub ctx: BuildContext,
    pub resolver: StoreResolver,
    pub runner: SystemRunner,
}

/// Load the recipe from `root`
pub fn load_recipe(root: &Path) -> Result<Recipe> {
    let recipe_path = root.join(defaults::RECIPE_FILE);
    if !recipe_path.exists() {
        bail!(
            "No {} found in {}. Run 'carbio init' to create one.",
            defaults::RECIPE_FILE,
            root.display()
        );
    }
    Recipe::load(&recipe_path)
        .with_context(|| format!("Failed to load recipe from {}", recipe_path.display()))
}

/// Load the recipe and global config, resolving values by priority
pub fn open_project(root: &Path, overrides: Overrides) -> Result<Project> {
    let recipe = load_recipe(root)?;
    let dirs = CarbioDirs::new();
    let global = GlobalConfig::load(&dirs).context("Failed to load global configuration")?;

    let store = global.store_dir(&dirs);
    tracing::debug!("Package store: {}", store.display());

    let options = ContextOptions {
        build_type: overrides.build_type,
        jobs: global.build_jobs(overrides.jobs),
        package_dir: overrides.output,
        cmake: global.cmake(recipe.tools.cmake.as_deref()),
        ctest: global.ctest(recipe.tools.ctest.as_deref()),
    };

    Ok(Project {
        ctx: BuildContext::new(root, recipe, options),
        resolver: StoreResolver::new(store),
        runner: SystemRunner::new().captured(is_quiet() || is_json()),
    })
}

/// Status line for a completed stage
pub fn report_stage(stage: Stage) {
    let message = match stage {
        Stage::Idle => return,
        Stage::OptionsApplied => "Applied dependency options",
        Stage::RequirementsDeclared => "Declared requirements",
        Stage::ToolchainGenerated => "Generated toolchain",
        Stage::DependenciesGenerated => "Generated dependency descriptors",
        Stage::Configured => "Configured",
        Stage::Built => "Built",
        Stage::Tested => "Tests passed",
        Stage::Packaged => "Packaged",
    };
    print_success(message);
}
