//! Dependency declarations
//!
//! A declaration names an external package, the minimum version required and
//! whether it is linked into the artifact or only visible to the test suite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RecipeError, StageError};

/// How a dependency is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Linked into the produced artifact
    Build,
    /// Visible only while building and running tests/benchmarks
    Test,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// A `name/version` package reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub name: String,
    pub version: semver::Version,
}

impl FromStr for DependencyRef {
    type Err = RecipeError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RecipeError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (name, version) = reference
            .split_once('/')
            .ok_or_else(|| invalid("expected 'name/version'"))?;

        if !is_valid_name(name) {
            return Err(invalid(
                "name must be lowercase alphanumeric, '-', '_' or '.'",
            ));
        }

        let version = parse_version(version).ok_or_else(|| invalid("version is not semver"))?;

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}

/// Parse a version, accepting the `major.minor` shorthand common in C++ packages.
pub fn parse_version(raw: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(raw) {
        return Some(v);
    }
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() == 2 && parts.iter().all(|p| p.parse::<u64>().is_ok()) {
        return semver::Version::parse(&format!("{raw}.0")).ok();
    }
    None
}

/// A named, versioned requirement with a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub name: String,
    /// Minimum acceptable version
    pub version: semver::Version,
    pub role: Role,
}

impl DependencyDeclaration {
    pub fn new(reference: DependencyRef, role: Role) -> Self {
        Self {
            name: reference.name,
            version: reference.version,
            role,
        }
    }

    /// Imported CMake target name
    pub fn target(&self) -> String {
        format!("{0}::{0}", self.name)
    }

    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// The requirement set of one orchestration run
///
/// Declarations can be added until [`Requirements::freeze`] is called.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    declarations: Vec<DependencyDeclaration>,
    frozen: bool,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration
    pub fn add(&mut self, declaration: DependencyDeclaration) -> Result<(), crate::error::CarbioError> {
        if self.frozen {
            return Err(StageError::RequirementsFrozen {
                name: declaration.name,
            }
            .into());
        }
        if self.get(&declaration.name).is_some() {
            return Err(RecipeError::DuplicateDependency {
                name: declaration.name,
            }
            .into());
        }
        self.declarations.push(declaration);
        Ok(())
    }

    /// Fix the set; generation may start afterwards
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn get(&self, name: &str) -> Option<&DependencyDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All declarations in declaration order
    pub fn all(&self) -> &[DependencyDeclaration] {
        &self.declarations
    }

    /// Declarations linked into the artifact
    pub fn link_set(&self) -> impl Iterator<Item = &DependencyDeclaration> {
        self.declarations.iter().filter(|d| d.role == Role::Build)
    }

    /// Declarations visible only to the test suite
    pub fn test_set(&self) -> impl Iterator<Item = &DependencyDeclaration> {
        self.declarations.iter().filter(|d| d.role == Role::Test)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarbioError;
    use proptest::prelude::*;

    fn decl(reference: &str, role: Role) -> DependencyDeclaration {
        DependencyDeclaration::new(reference.parse().unwrap(), role)
    }

    #[test]
    fn test_declaration_serializes_version_as_string() {
        let declaration = decl("gtest/1.16.0", Role::Test);
        let text = toml::to_string(&declaration).unwrap();
        assert!(text.contains("version = \"1.16.0\""));
        assert!(text.contains("role = \"test\""));
        assert_eq!(toml::from_str::<DependencyDeclaration>(&text).unwrap(), declaration);
    }

    #[test]
    fn test_parse_reference() {
        let r: DependencyRef = "spdlog/1.15.3".parse().unwrap();
        assert_eq!(r.name, "spdlog");
        assert_eq!(r.version, semver::Version::new(1, 15, 3));
        assert_eq!(r.to_string(), "spdlog/1.15.3");
    }

    #[test]
    fn test_parse_reference_two_component_version() {
        let r: DependencyRef = "gtest/1.16".parse().unwrap();
        assert_eq!(r.version, semver::Version::new(1, 16, 0));
    }

    #[test]
    fn test_parse_reference_rejects_malformed() {
        for bad in ["spdlog", "spdlog/", "/1.0.0", "Spdlog/1.0.0", "spdlog/latest", "a b/1.0.0"] {
            assert!(
                matches!(
                    bad.parse::<DependencyRef>(),
                    Err(RecipeError::InvalidReference { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_target_name() {
        assert_eq!(decl("benchmark/1.9.4", Role::Test).target(), "benchmark::benchmark");
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut reqs = Requirements::new();
        reqs.add(decl("spdlog/1.15.3", Role::Build)).unwrap();
        let err = reqs.add(decl("spdlog/1.14.0", Role::Test)).unwrap_err();
        assert!(matches!(
            err,
            CarbioError::Recipe(RecipeError::DuplicateDependency { .. })
        ));
    }

    #[test]
    fn test_frozen_requirements_reject_additions() {
        let mut reqs = Requirements::new();
        reqs.add(decl("spdlog/1.15.3", Role::Build)).unwrap();
        reqs.freeze();
        let err = reqs.add(decl("gtest/1.16.0", Role::Test)).unwrap_err();
        assert!(matches!(
            err,
            CarbioError::Stage(StageError::RequirementsFrozen { .. })
        ));
        assert_eq!(reqs.len(), 1);
    }

    #[test]
    fn test_link_and_test_sets_split_by_role() {
        let mut reqs = Requirements::new();
        reqs.add(decl("spdlog/1.15.3", Role::Build)).unwrap();
        reqs.add(decl("gtest/1.16.0", Role::Test)).unwrap();
        reqs.add(decl("benchmark/1.9.4", Role::Test)).unwrap();

        let link: Vec<_> = reqs.link_set().map(|d| d.name.as_str()).collect();
        let test: Vec<_> = reqs.test_set().map(|d| d.name.as_str()).collect();
        assert_eq!(link, ["spdlog"]);
        assert_eq!(test, ["gtest", "benchmark"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// No test-only declaration ever leaks into the link set.
        #[test]
        fn prop_link_set_excludes_test_only(
            roles in proptest::collection::vec(any::<bool>(), 0..12),
        ) {
            let mut reqs = Requirements::new();
            for (i, is_test) in roles.iter().enumerate() {
                let role = if *is_test { Role::Test } else { Role::Build };
                reqs.add(decl(&format!("dep{i}/1.0.0"), role)).unwrap();
            }

            for d in reqs.link_set() {
                prop_assert_eq!(d.role, Role::Build);
            }
            prop_assert_eq!(
                reqs.link_set().count() + reqs.test_set().count(),
                reqs.len()
            );
        }

        #[test]
        fn prop_reference_parses_generated_names(
            name in "[a-z][a-z0-9_-]{0,15}",
            (major, minor, patch) in (0u64..50, 0u64..50, 0u64..50),
        ) {
            let reference = format!("{name}/{major}.{minor}.{patch}");
            let parsed: DependencyRef = reference.parse().unwrap();
            prop_assert_eq!(parsed.to_string(), reference);
        }
    }
}
