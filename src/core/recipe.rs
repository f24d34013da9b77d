//! Recipe (carbio.toml) parsing and validation
//!
//! The recipe is the declarative build description: project identity,
//! settings, requirements, dependency options, folder layout and build
//! driver configuration. String values may reference environment variables
//! with `${VAR}` syntax.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::defaults;
use crate::core::dependency::{DependencyDeclaration, DependencyRef, Requirements, Role};
use crate::core::options::{OptionSet, PackageOptions};
use crate::core::settings::{BuildType, SettingsConfig};
use crate::error::{CarbioError, RecipeError};
use crate::infra::filesystem;

/// The project recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub project: ProjectConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub requirements: RequirementsConfig,

    /// Dependency name -> options
    #[serde(default)]
    pub options: BTreeMap<String, PackageOptions>,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub cmake: CmakeConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Project identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Declared requirements as `name/version` references
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequirementsConfig {
    /// Linked into the artifact
    #[serde(default)]
    pub requires: Vec<String>,

    /// Visible only to tests and benchmarks
    #[serde(default)]
    pub test_requires: Vec<String>,
}

/// Folder overrides, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default = "default_generators")]
    pub generators: String,

    #[serde(default = "default_package")]
    pub package: String,
}

fn default_generators() -> String {
    defaults::GENERATORS_DIR.to_string()
}

fn default_package() -> String {
    defaults::PACKAGE_DIR.to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            generators: default_generators(),
            package: default_package(),
        }
    }
}

/// Build driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CmakeConfig {
    /// CMake generator (`-G`); the CMake default when unset
    #[serde(default)]
    pub generator: Option<String>,

    /// Extra `-D` cache definitions
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,

    /// Arguments appended to the test runner invocation
    #[serde(default = "default_ctest_args")]
    pub ctest_args: Vec<String>,
}

fn default_ctest_args() -> Vec<String> {
    defaults::DEFAULT_CTEST_ARGS
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for CmakeConfig {
    fn default() -> Self {
        Self {
            generator: None,
            definitions: BTreeMap::new(),
            ctest_args: default_ctest_args(),
        }
    }
}

impl CmakeConfig {
    /// Multi-config generators select the build type at build time
    pub fn is_multi_config(&self) -> bool {
        self.generator.as_deref().is_some_and(|g| {
            g.starts_with("Visual Studio") || g == "Xcode" || g.ends_with("Multi-Config")
        })
    }
}

/// External tool executables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default)]
    pub cmake: Option<String>,

    #[serde(default)]
    pub ctest: Option<String>,
}

/// Substitute environment variables in a string using ${VAR} syntax.
///
/// Unset variables expand to the empty string.
///
/// # Examples
/// ```
/// use carbio::core::recipe::substitute_env_vars;
///
/// std::env::set_var("CARBIO_DOC_VAR", "hello");
/// assert_eq!(substitute_env_vars("prefix_${CARBIO_DOC_VAR}_suffix"), "prefix_hello_suffix");
/// std::env::remove_var("CARBIO_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => *s = substitute_env_vars(s),
        toml::Value::Array(arr) => arr.iter_mut().for_each(substitute_in_value),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| substitute_in_value(v)),
        _ => {}
    }
}

impl Recipe {
    /// Load the recipe from a file, substituting environment variables
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        if !path.exists() {
            return Err(RecipeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| RecipeError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut value: toml::Value =
            toml::from_str(&content).map_err(|e| RecipeError::Parse(e.to_string()))?;
        substitute_in_value(&mut value);

        let recipe = value
            .try_into::<Self>()
            .map_err(|e| RecipeError::Parse(e.to_string()))?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Parse a recipe from a TOML string (no substitution)
    pub fn from_toml(content: &str) -> Result<Self, RecipeError> {
        toml::from_str(content).map_err(|e| RecipeError::Parse(e.to_string()))
    }

    /// Serialize the recipe to a TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The Carbio recipe: spdlog linked header-only without exceptions,
    /// gtest and benchmark for the test suite.
    pub fn carbio_default() -> Self {
        let mut spdlog = PackageOptions::new();
        spdlog.insert("no_exceptions".to_string(), toml::Value::Boolean(true));
        spdlog.insert("header_only".to_string(), toml::Value::Boolean(true));
        spdlog.insert("use_std_fmt".to_string(), toml::Value::Boolean(false));

        let mut options = BTreeMap::new();
        options.insert("spdlog".to_string(), spdlog);

        Self {
            project: ProjectConfig {
                name: "carbio".to_string(),
                version: default_version(),
                description: None,
            },
            settings: SettingsConfig {
                build_type: Some(BuildType::Release),
                ..SettingsConfig::default()
            },
            requirements: RequirementsConfig {
                requires: vec!["spdlog/1.15.3".to_string()],
                test_requires: vec!["gtest/1.16.0".to_string(), "benchmark/1.9.4".to_string()],
            },
            options,
            layout: LayoutConfig::default(),
            cmake: CmakeConfig::default(),
            tools: ToolsConfig::default(),
        }
    }

    /// Check structural rules that serde cannot express
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.project.name.trim().is_empty() {
            return Err(RecipeError::MissingField {
                field: "project.name".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for reference in self.references() {
            let (parsed, _) = reference?;
            if !seen.insert(parsed.name.clone()) {
                return Err(RecipeError::DuplicateDependency { name: parsed.name });
            }
        }

        if self.layout.generators.trim().is_empty() {
            return Err(RecipeError::MissingField {
                field: "layout.generators".to_string(),
            });
        }
        for (field, value) in [
            ("layout.generators", &self.layout.generators),
            ("layout.package", &self.layout.package),
        ] {
            if !filesystem::is_strictly_inside(Path::new(value)) {
                return Err(RecipeError::InvalidLayout {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        if let Some(package) = self.options.keys().find(|p| !seen.contains(*p)) {
            return Err(RecipeError::UndeclaredOptionTarget {
                package: package.clone(),
            });
        }

        Ok(())
    }

    fn references(&self) -> impl Iterator<Item = Result<(DependencyRef, Role), RecipeError>> + '_ {
        let build = self.requirements.requires.iter().map(|r| (r, Role::Build));
        let test = self.requirements.test_requires.iter().map(|r| (r, Role::Test));
        build
            .chain(test)
            .map(|(r, role)| r.parse::<DependencyRef>().map(|parsed| (parsed, role)))
    }

    /// Register every declared dependency into `requirements`
    pub fn declare_into(&self, requirements: &mut Requirements) -> Result<(), CarbioError> {
        for reference in self.references() {
            let (parsed, role) = reference?;
            requirements.add(DependencyDeclaration::new(parsed, role))?;
        }
        Ok(())
    }

    /// The Option Set described by the recipe
    pub fn option_set(&self) -> OptionSet {
        OptionSet::new(self.options.clone())
    }
}
