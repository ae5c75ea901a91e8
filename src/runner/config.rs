//! Run configuration types and loading
//!
//! A run configuration (`tcex.json` by default) declares the profiles an
//! App can be executed under, plus optional include directories whose
//! files each hold a JSON array of additional profiles. Everything is
//! deserialized into typed structures up front; defaults are declared
//! here rather than applied at each access site.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Top-level run configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunConfig {
    /// Profiles declared inline
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// Directories (relative to the App directory) whose JSON files hold
    /// additional profile lists
    #[serde(default)]
    pub profile_include_dirs: Vec<PathBuf>,

    /// Default inter-profile delay in seconds
    #[serde(default)]
    pub sleep: Option<u64>,

    /// Staging/validation helper executable (default: `tcdata`)
    #[serde(default)]
    pub helper: Option<String>,
}

/// A named, reusable execution configuration for one run of a target App
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub profile_name: String,

    /// Optional group tag used for batch selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Executable module name of the App (`.py` appended when missing)
    pub script: String,

    /// Argument mapping, resolved to CLI tokens in declared order
    #[serde(default)]
    pub args: Map<String, Value>,

    /// Accepted App exit codes
    #[serde(default = "default_exit_codes")]
    pub exit_codes: Vec<i32>,

    /// Files staged through the helper before the App runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_files: Vec<PathBuf>,

    /// Output validations run through the helper after the App exits
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,

    /// Per-profile inter-run delay in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u64>,

    /// Suppress the App's stdout
    #[serde(default)]
    pub quiet: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_exit_codes() -> Vec<i32> {
    vec![0]
}

/// A single output validation consumed by the helper's `--validate` mode
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationRule {
    /// Output variable identifier, e.g. `#App:0001:url!String`
    pub variable: String,

    /// Comparison operator (`ne`, `ni`, `it`, ...)
    pub operator: String,

    /// Expected value or type tag
    pub data: Value,
}

/// Load a run configuration and merge profiles from its include dirs.
///
/// Include directories are resolved relative to `app_path`; files are
/// read in sorted name order and each must be a JSON array of profiles.
/// Included profiles are appended as-is, never deduplicated.
pub fn load(config_path: &Path, app_path: &Path) -> Result<RunConfig> {
    if !config_path.is_file() {
        return Err(Error::ConfigNotFound(config_path.to_path_buf()));
    }

    println!(
        "Configuration File: {}",
        config_path.display().to_string().cyan().bold()
    );

    let content =
        fs::read_to_string(config_path).map_err(|e| Error::file_read(config_path, e))?;
    let mut config: RunConfig =
        serde_json::from_str(&content).map_err(|e| Error::malformed(config_path, e))?;

    let include_dirs = config.profile_include_dirs.clone();
    for directory in &include_dirs {
        let profiles = load_include_dir(&app_path.join(directory))?;
        config.profiles.extend(profiles);
    }

    Ok(config)
}

/// Load every profile list file from one include directory
fn load_include_dir(directory: &Path) -> Result<Vec<Profile>> {
    if !directory.is_dir() {
        return Err(Error::IncludeDirNotFound(directory.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut profiles = Vec::new();
    for file in files {
        println!(
            "Include File: {}",
            file.display().to_string().cyan().bold()
        );
        let content = fs::read_to_string(&file).map_err(|e| Error::file_read(&file, e))?;
        let included: Vec<Profile> =
            serde_json::from_str(&content).map_err(|e| Error::malformed(&file, e))?;
        profiles.extend(included);
    }

    Ok(profiles)
}
