//! Error types for carbio
//!
//! Domain-specific error types using thiserror.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::orchestrator::Stage;

/// A failed external tool invocation, reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    /// Rendered command line
    pub command: String,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured stderr (empty when output was streamed to the terminal)
    pub stderr: String,
}

impl ToolFailure {
    /// Failure for a tool that could not be started at all
    pub fn spawn(command: impl Into<String>, error: &std::io::Error) -> Self {
        Self {
            command: command.into(),
            code: None,
            stderr: error.to_string(),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "`{}` exited with status {code}", self.command)?,
            None => write!(f, "`{}` did not complete", self.command)?,
        }
        if !self.stderr.is_empty() {
            write!(f, "\n{}", self.stderr.trim_end())?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolFailure {}

/// Recipe (carbio.toml) errors
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Recipe file missing
    #[error("Recipe not found at '{path}'. Run 'carbio init' to create one.")]
    NotFound { path: PathBuf },

    /// Recipe could not be read
    #[error("Failed to read recipe '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// TOML syntax or structure error
    #[error("Failed to parse recipe: {0}")]
    Parse(String),

    /// Malformed `name/version` reference
    #[error("Invalid dependency reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Same dependency declared more than once
    #[error("Dependency '{name}' is declared more than once")]
    DuplicateDependency { name: String },

    /// Unknown or malformed setting
    #[error("Invalid setting '{setting}': {reason}")]
    InvalidSetting { setting: String, reason: String },

    /// Missing required field
    #[error("Recipe is missing required field '{field}'")]
    MissingField { field: String },

    /// Layout folder outside the project or equal to its root
    #[error("Invalid layout '{field}' = '{value}': must be a relative folder inside the project")]
    InvalidLayout { field: String, value: String },

    /// `[options.<name>]` for a dependency the recipe does not declare
    #[error("Options target '{package}', which is not a declared dependency")]
    UndeclaredOptionTarget { package: String },
}

/// Dependency option errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    /// Options were set for a dependency that is not declared
    #[error("Options target '{package}', which is not a declared dependency")]
    UndeclaredDependency { package: String },

    /// Option value is not a scalar
    #[error("Option '{package}:{option}' must be a bool, string or integer, got {got}")]
    InvalidValue {
        package: String,
        option: String,
        got: String,
    },

    /// Options contradict how the dependency is consumed
    #[error("Options for '{package}' are inconsistent: {message}")]
    Inconsistent { package: String, message: String },
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Package metadata could not be parsed
    #[error("Invalid package metadata '{path}': {error}")]
    Metadata { path: PathBuf, error: String },

    /// Store could not be scanned
    #[error("Failed to read package store '{path}': {error}")]
    Store { path: PathBuf, error: String },
}

/// Configure-phase errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A generated descriptor is missing
    #[error("Missing generated descriptor '{path}'. Run 'carbio generate' first.")]
    MissingDescriptor { path: PathBuf },

    /// A declared dependency has no resolved artifact
    #[error("Dependency '{name}/{version}' has no resolved artifact in the package store")]
    Unresolved { name: String, version: String },

    /// Generated descriptors disagree with each other or the recipe
    #[error("Generated descriptors are inconsistent: {message}")]
    Inconsistent { message: String },

    /// The build driver failed
    #[error("Configure failed: {0}")]
    Tool(ToolFailure),
}

/// Compile/link errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// The build driver failed
    #[error("Build failed: {0}")]
    Tool(ToolFailure),
}

/// Test-suite errors
#[derive(Error, Debug)]
pub enum TestFailure {
    /// One or more tests failed
    #[error("Tests failed: {0}")]
    Tool(ToolFailure),
}

/// Install/packaging errors
#[derive(Error, Debug)]
pub enum PackagingError {
    /// No successful build to install from
    #[error("No successful build found in '{build_dir}'. Run 'carbio build' first.")]
    NotBuilt { build_dir: PathBuf },

    /// The install step failed
    #[error("Install failed: {0}")]
    Tool(ToolFailure),

    /// Package manifest could not be produced
    #[error("Failed to write package manifest: {error}")]
    Manifest { error: String },
}

/// Orchestration ordering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Step invoked from the wrong stage
    #[error("Cannot {step} from stage {actual}; expected {expected}")]
    OutOfOrder {
        step: &'static str,
        expected: Stage,
        actual: Stage,
    },

    /// Requirements can no longer change
    #[error("Requirements are frozen; cannot add '{name}'")]
    RequirementsFrozen { name: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Project initialization errors
#[derive(Error, Debug)]
pub enum InitError {
    /// Target directory does not exist
    #[error("Directory does not exist: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A recipe is already present
    #[error("'{path}' already exists. Use --force to overwrite it.")]
    RecipeExists { path: PathBuf },

    /// Recipe could not be rendered
    #[error("Failed to render recipe: {error}")]
    Render { error: String },

    /// I/O error
    #[error("I/O error at '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Top-level carbio error type
#[derive(Error, Debug)]
pub enum CarbioError {
    /// Recipe error
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Option error
    #[error("Option error: {0}")]
    Option(#[from] OptionError),

    /// Resolve error
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Test failure
    #[error("Test failure: {0}")]
    Test(#[from] TestFailure),

    /// Packaging error
    #[error("Packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// Stage error
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Init error
    #[error("Init error: {0}")]
    Init(#[from] InitError),
}

impl CarbioError {
    /// The underlying tool's failure, if this error came from one
    pub fn tool_failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Configuration(ConfigurationError::Tool(t))
            | Self::Build(BuildError::Tool(t))
            | Self::Test(TestFailure::Tool(t))
            | Self::Packaging(PackagingError::Tool(t)) => Some(t),
            _ => None,
        }
    }

    /// Process exit code: the tool's own code when it reported one, else 1
    pub fn exit_code(&self) -> i32 {
        self.tool_failure()
            .and_then(|t| t.code)
            .filter(|&code| code != 0)
            .unwrap_or(1)
    }
}
