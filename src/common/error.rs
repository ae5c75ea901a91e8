//! Error types for the tiapp CLI
//!
//! Error messages name the offending file or flag so a failing CI run can
//! be fixed from the log alone.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tiapp CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Provided config file does not exist ({})", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Provided include directory does not exist ({})", .0.display())]
    IncludeDirNotFound(PathBuf),

    #[error("Invalid JSON file '{}': {error}", .path.display())]
    MalformedConfig { path: PathBuf, error: String },

    // === Run Errors ===
    #[error("Could not find script ({0})")]
    ScriptNotFound(String),

    #[error("Could not find data file ({})", .0.display())]
    DataFileNotFound(PathBuf),

    #[error("Failed to stage data for file {} (exit code {code})", .file.display())]
    StagingFailed { file: PathBuf, code: i32 },

    #[error("Failed variable validation (exit code {code})")]
    ValidationFailed { code: i32 },

    // === Parameter Errors ===
    #[error("Dictionary types are not supported for field {0}")]
    UnsupportedParameterType(String),

    // === Executable Resolution Errors ===
    #[error("Could not find interpreter '{0}' on PATH")]
    InterpreterNotFound(String),

    #[error("Could not find staging helper '{0}' on PATH")]
    HelperNotFound(String),

    // === Deps Errors ===
    #[error("pip install failed for {lib_dir} (exit code {code})")]
    PipFailed { lib_dir: String, code: i32 },

    #[error("Encountered error running pip install for {app_name}: lib directory {} is empty", .lib_dir.display())]
    EmptyLibDir { app_name: String, lib_dir: PathBuf },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for a fatal error.
    ///
    /// Staging and validation failures propagate the helper's own exit
    /// code; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::StagingFailed { code, .. } | Error::ValidationFailed { code } => *code,
            _ => 1,
        }
    }

    /// Create a malformed-config error for a file
    pub fn malformed(path: &std::path::Path, error: impl ToString) -> Self {
        Self::MalformedConfig {
            path: path.to_path_buf(),
            error: error.to_string(),
        }
    }

    /// Create a file-read error
    pub fn file_read(path: &std::path::Path, error: impl ToString) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
