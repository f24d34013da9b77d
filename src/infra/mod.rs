//! Infrastructure layer
//!
//! Handles I/O: the filesystem, platform directories and external
//! processes.

pub mod dirs;
pub mod filesystem;
pub mod process;
