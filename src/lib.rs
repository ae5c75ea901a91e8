//! tiapp - tooling for threat-intelligence platform Apps
//!
//! This library backs the `tiapp` CLI: a profile-driven App runner, a
//! test-profile generator for `install.json` manifests, and a pip-based
//! dependency installer for App lib directories.

pub mod cli;
pub mod commands;
pub mod common;
pub mod deps;
pub mod profile;
pub mod runner;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::config::{Profile, RunConfig, ValidationRule};
