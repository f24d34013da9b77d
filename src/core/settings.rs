//! Platform and compiler settings
//!
//! Settings describe the target the toolchain descriptor is generated for.
//! Anything the recipe leaves out is detected from the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RecipeError;

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(RecipeError::InvalidSetting {
                setting: "build_type".to_string(),
                reason: format!(
                    "'{s}' is not one of Debug, Release, RelWithDebInfo, MinSizeRel"
                ),
            }),
        }
    }
}

impl TryFrom<String> for BuildType {
    type Error = RecipeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BuildType> for String {
    fn from(value: BuildType) -> Self {
        value.as_str().to_string()
    }
}

/// Compiler identity forwarded to the toolchain descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Compiler family (gcc, clang, apple-clang, msvc)
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    /// C++ standard, e.g. "17" or "gnu20"
    #[serde(default)]
    pub cppstd: Option<String>,

    /// C++ standard library (libstdc++11, libc++)
    #[serde(default)]
    pub libcxx: Option<String>,
}

impl CompilerSettings {
    /// C and C++ compiler executables for families we know
    pub fn executables(&self) -> Option<(&'static str, &'static str)> {
        match self.name.as_str() {
            "gcc" => Some(("gcc", "g++")),
            "clang" | "apple-clang" => Some(("clang", "clang++")),
            "msvc" => Some(("cl", "cl")),
            _ => None,
        }
    }

    /// The numeric C++ standard and whether GNU extensions are requested
    pub fn cxx_standard(&self) -> Option<(String, bool)> {
        self.cppstd.as_ref().map(|std| match std.strip_prefix("gnu") {
            Some(level) => (level.to_string(), true),
            None => (std.clone(), false),
        })
    }
}

/// Settings as written in the recipe; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub os: Option<String>,

    #[serde(default)]
    pub arch: Option<String>,

    #[serde(default)]
    pub build_type: Option<BuildType>,

    #[serde(default)]
    pub compiler: Option<CompilerSettings>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub os: String,
    pub arch: String,
    pub build_type: BuildType,
    pub compiler: Option<CompilerSettings>,
}

impl Settings {
    /// Fill recipe settings from the host, with an optional build type override
    pub fn resolve(config: &SettingsConfig, build_type: Option<BuildType>) -> Self {
        Self {
            os: config.os.clone().unwrap_or_else(host_os),
            arch: config.arch.clone().unwrap_or_else(host_arch),
            build_type: build_type.or(config.build_type).unwrap_or_default(),
            compiler: config.compiler.clone(),
        }
    }

    /// Whether the settings target something other than the running host
    pub fn is_cross(&self) -> bool {
        self.os != host_os() || self.arch != host_arch()
    }

    /// `CMAKE_SYSTEM_NAME` for the target OS
    pub fn cmake_system_name(&self) -> &str {
        match self.os.as_str() {
            "Macos" => "Darwin",
            other => other,
        }
    }

    /// `CMAKE_SYSTEM_PROCESSOR` for the target arch
    pub fn cmake_system_processor(&self) -> &str {
        match self.arch.as_str() {
            "armv8" => "aarch64",
            "x86" => "i686",
            other => other,
        }
    }
}

/// Host OS in settings vocabulary
pub fn host_os() -> String {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Macos",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
    .to_string()
}

/// Host architecture in settings vocabulary
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "aarch64" => "armv8",
        "arm" => "armv7",
        other => other,
    }
    .to_string()
}
