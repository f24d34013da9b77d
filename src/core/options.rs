//! Dependency options
//!
//! Per-dependency toggles (`[options.<dep>]` in the recipe). Options are
//! applied before requirements are declared and checked against the
//! requirement set before any resolution happens.

use std::collections::BTreeMap;

use crate::core::dependency::Requirements;
use crate::error::OptionError;

/// Option that makes a package consumable without a library artifact
pub const HEADER_ONLY: &str = "header_only";

/// Option that selects a shared library artifact
pub const SHARED: &str = "shared";

/// Options of a single dependency
pub type PackageOptions = BTreeMap<String, toml::Value>;

/// Option Set: dependency name -> option name -> scalar value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    options: BTreeMap<String, PackageOptions>,
    applied: bool,
}

impl OptionSet {
    pub fn new(options: BTreeMap<String, PackageOptions>) -> Self {
        Self {
            options,
            applied: false,
        }
    }

    /// Set a single option
    pub fn set(&mut self, package: &str, option: &str, value: toml::Value) {
        self.options
            .entry(package.to_string())
            .or_default()
            .insert(option.to_string(), value);
    }

    /// Apply the set: every value must be a scalar and the toggles must
    /// describe an artifact the package can produce.
    pub fn apply(&mut self) -> Result<(), OptionError> {
        for (package, opts) in &self.options {
            for (option, value) in opts {
                validate_scalar(package, option, value)?;
            }

            if is_truthy(opts.get(HEADER_ONLY)) && is_truthy(opts.get(SHARED)) {
                return Err(OptionError::Inconsistent {
                    package: package.clone(),
                    message: "header_only cannot be combined with shared".to_string(),
                });
            }

            tracing::debug!("Applied {} option(s) to {package}", opts.len());
        }
        self.applied = true;
        Ok(())
    }

    /// Every package carrying options must be a declared dependency
    pub fn check_targets(&self, requirements: &Requirements) -> Result<(), OptionError> {
        match self.packages().find(|p| !requirements.contains(p)) {
            Some(package) => Err(OptionError::UndeclaredDependency {
                package: package.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Options for one package (empty when none were set)
    pub fn for_package(&self, package: &str) -> PackageOptions {
        self.options.get(package).cloned().unwrap_or_default()
    }

    pub fn is_header_only(&self, package: &str) -> bool {
        self.enabled(package, HEADER_ONLY)
    }

    /// Whether a boolean-ish option is switched on
    pub fn enabled(&self, package: &str, option: &str) -> bool {
        is_truthy(self.options.get(package).and_then(|o| o.get(option)))
    }

    /// Packages with at least one option
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// One `package.option=value` line per option, in sorted order
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (package, opts) in &self.options {
            for (option, value) in opts {
                out.push_str(&format!("{package}.{option}={value}\n"));
            }
        }
        out
    }
}

fn validate_scalar(package: &str, option: &str, value: &toml::Value) -> Result<(), OptionError> {
    match value {
        toml::Value::Boolean(_) | toml::Value::String(_) | toml::Value::Integer(_) => Ok(()),
        other => Err(OptionError::InvalidValue {
            package: package.to_string(),
            option: option.to_string(),
            got: other.type_str().to_string(),
        }),
    }
}

/// Truthiness of an option value; strings accept the usual CMake spellings
pub fn is_truthy(value: Option<&toml::Value>) -> bool {
    match value {
        Some(toml::Value::Boolean(b)) => *b,
        Some(toml::Value::Integer(i)) => *i != 0,
        Some(toml::Value::String(s)) => matches!(
            s.to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        ),
        _ => false,
    }
}

/// Render an option value as a CMake literal
pub fn cmake_value(value: &toml::Value) -> String {
    match value {
        toml::Value::Boolean(true) => "ON".to_string(),
        toml::Value::Boolean(false) => "OFF".to_string(),
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
