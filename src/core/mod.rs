//! Core business logic module
//!
//! Recipe handling, generation and orchestration. Process execution and
//! platform directories live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`recipe`] - Recipe (carbio.toml) parsing and validation
//! - [`settings`] - Platform, compiler and build type settings
//! - [`dependency`] - Dependency declarations and the requirement set
//! - [`options`] - Per-dependency option set
//! - [`layout`] - Build folder layout
//! - [`resolver`] - Locating installed dependencies in the package store
//! - [`toolchain`] - CMake toolchain descriptor generation
//! - [`deps`] - CMake dependency descriptor generation
//! - [`lock`] - Generator lock file
//! - [`build_driver`] - CMake/CTest invocations
//! - [`orchestrator`] - Stage sequencing
//! - [`package`] - Package manifest
//! - [`global_config`] - Global configuration
//! - [`init`] - Project initialization logic
//! - [`clean`] - Clean build artifacts logic
//! - [`doctor`] - Tool and project checks

pub mod build_driver;
pub mod clean;
pub mod dependency;
pub mod deps;
pub mod doctor;
pub mod global_config;
pub mod init;
pub mod layout;
pub mod lock;
pub mod options;
pub mod orchestrator;
pub mod package;
pub mod recipe;
pub mod resolver;
pub mod settings;
pub mod toolchain;
