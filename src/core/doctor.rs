//! Doctor command logic
//!
//! Checks that the build tools are installed and that the project recipe
//! and package store are usable.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::defaults;
use crate::core::recipe::Recipe;

/// C++ compilers probed in order
const CXX_COMPILERS: &[&str] = &["c++", "g++", "clang++"];

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub version: Option<String>,
    pub error: Option<String>,
    pub suggestion: Option<String>,
    /// Whether a failure blocks builds
    pub required: bool,
}

impl CheckResult {
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
    /// Recipe and store problems
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Version reported by `<command> --version`, if the command runs
pub fn check_command_available(command: &str) -> Option<String> {
    let program = which::which(command).ok()?;
    let output = std::process::Command::new(program)
        .arg("--version")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Some(extract_version(&combined).unwrap_or_else(|| "unknown".to_string()))
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").expect("static regex is valid"))
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    version_regex()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check CMake availability
pub fn check_cmake(program: &str) -> CheckResult {
    match check_command_available(program) {
        Some(version) => CheckResult::pass("CMake", Some(version), true),
        None => CheckResult::fail(
            "CMake",
            &format!("'{program}' not found in PATH"),
            Some("Install CMake from https://cmake.org/download/ or use your package manager"),
            true,
        ),
    }
}

/// Check CTest availability
pub fn check_ctest(program: &str) -> CheckResult {
    match check_command_available(program) {
        Some(version) => CheckResult::pass("CTest", Some(version), true),
        None => CheckResult::fail(
            "CTest",
            &format!("'{program}' not found in PATH"),
            Some("CTest ships with CMake; check that the CMake bin folder is on PATH"),
            true,
        ),
    }
}

/// Check for any C++ compiler
pub fn check_cxx_compiler() -> CheckResult {
    for compiler in CXX_COMPILERS {
        if let Some(version) = check_command_available(compiler) {
            return CheckResult::pass(&format!("C++ compiler ({compiler})"), Some(version), true);
        }
    }
    CheckResult::fail(
        "C++ compiler",
        "No C++ compiler (c++, g++, clang++) found in PATH",
        Some("Install GCC or Clang"),
        true,
    )
}

/// Check Ninja availability (optional, only needed for Ninja generators)
pub fn check_ninja() -> CheckResult {
    match check_command_available("ninja") {
        Some(version) => CheckResult::pass("Ninja", Some(version), false),
        None => CheckResult::fail(
            "Ninja",
            "Ninja not found in PATH",
            Some("Install Ninja to use the Ninja generators (optional)"),
            false,
        ),
    }
}

/// Check the recipe and the store it resolves against
pub fn check_project_config(project_dir: &Path, store: &Path) -> Vec<String> {
    let mut issues = Vec::new();
    let recipe_path = project_dir.join(defaults::RECIPE_FILE);
    if !recipe_path.exists() {
        return issues;
    }

    match Recipe::load(&recipe_path) {
        Ok(recipe) => {
            if !project_dir.join("CMakeLists.txt").exists() {
                issues.push("No CMakeLists.txt next to the recipe".to_string());
            }
            let declared = recipe
                .requirements
                .requires
                .iter()
                .chain(&recipe.requirements.test_requires);
            if declared.count() > 0 && !store.exists() {
                issues.push(format!("Package store '{}' does not exist", store.display()));
            }
        }
        Err(e) => issues.push(format!("Invalid recipe: {e}")),
    }

    issues
}

/// Run all doctor checks
pub fn run_doctor(cmake: &str, ctest: &str, project: Option<(&Path, &Path)>) -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_cmake(cmake));
    report.add_check(check_ctest(ctest));
    report.add_check(check_cxx_compiler());
    report.add_check(check_ninja());

    if let Some((dir, store)) = project {
        for issue in check_project_config(dir, store) {
            report.add_config_issue(issue);
        }
    }

    report
}
