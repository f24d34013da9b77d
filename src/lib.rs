//! Carbio - CMake build orchestrator
//!
//! Reads a declarative recipe, generates a CMake toolchain and dependency
//! descriptors from a local package store, and drives configure, build,
//! test and install through CMake and CTest.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Recipe, generation and orchestration logic
//! - [`infra`] - Infrastructure layer (filesystem, directories, processes)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
