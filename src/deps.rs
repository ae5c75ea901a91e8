//! App library dependency installation
//!
//! Installs an App's `requirements.txt` into a versioned lib directory
//! (`lib_3.11.2` style) with pip. A run configuration may instead declare
//! multiple `lib_versions` targets, one per interpreter, for Apps that
//! ship libs for several runtimes.

use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::common::{Error, Result};

/// Default interpreter used to build the lib directory
const DEFAULT_PYTHON: &str = "python3";

/// Options for one `tiapp deps` invocation
#[derive(Debug)]
pub struct DepsOptions {
    /// App name, used in diagnostics (defaults to the directory name)
    pub app_name: Option<String>,
    /// App directory containing `requirements.txt`
    pub app_path: PathBuf,
    /// Run configuration declaring `lib_versions` targets
    pub config: Option<PathBuf>,
}

/// `lib_versions` entries of a run configuration
#[derive(Debug, Deserialize)]
struct LibConfig {
    #[serde(default)]
    lib_versions: Vec<LibVersion>,
}

/// One interpreter/lib-directory pair
#[derive(Debug, Deserialize)]
struct LibVersion {
    python_executable: String,
    lib_dir: String,
}

/// Install App dependencies, in single or multi-target mode
pub async fn install(options: DepsOptions) -> Result<()> {
    match &options.config {
        Some(config) => install_multiple(&options, config).await,
        None => install_single(&options).await,
    }
}

/// Install into one lib directory named after the interpreter's version
async fn install_single(options: &DepsOptions) -> Result<()> {
    let python = which::which(DEFAULT_PYTHON)
        .map_err(|_| Error::InterpreterNotFound(DEFAULT_PYTHON.to_string()))?;

    let version = python_version(&python).await?;
    let lib_dir = format!("lib_{version}");
    println!("Creating Lib Directory: {}", lib_dir.cyan().bold());

    let app_name = options.app_name.clone().unwrap_or_else(|| {
        options
            .app_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string())
    });

    let lib_path = options.app_path.join(&lib_dir);
    if !lib_path.is_dir() {
        fs::create_dir_all(&lib_path)?;
    }

    let code = pip_install(&python, &options.app_path, &lib_path).await?;
    if code != 0 {
        return Err(Error::PipFailed { lib_dir, code });
    }

    // pip exits zero on an empty requirements resolution, so verify the
    // install actually produced something
    if fs::read_dir(&lib_path)?.next().is_none() {
        return Err(Error::EmptyLibDir {
            app_name,
            lib_dir: lib_path,
        });
    }

    Ok(())
}

/// Install every `lib_versions` target declared in the configuration.
///
/// Each target is attempted; the first failure is reported after the
/// remaining targets have run.
async fn install_multiple(options: &DepsOptions, config: &Path) -> Result<()> {
    let config_path = options.app_path.join(config);
    if !config_path.is_file() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let content =
        fs::read_to_string(&config_path).map_err(|e| Error::file_read(&config_path, e))?;
    let lib_config: LibConfig =
        serde_json::from_str(&content).map_err(|e| Error::malformed(&config_path, e))?;

    let mut first_failure: Option<Error> = None;
    for target in &lib_config.lib_versions {
        println!("Building Lib Dir: {}", target.lib_dir.cyan().bold());

        let python = PathBuf::from(shellexpand::tilde(&target.python_executable).into_owned());
        let lib_path = options.app_path.join(&target.lib_dir);
        if !lib_path.is_dir() {
            fs::create_dir_all(&lib_path)?;
        }

        let code = pip_install(&python, &options.app_path, &lib_path).await?;
        if code != 0 {
            println!("{}", "FAIL".red().bold());
            first_failure.get_or_insert(Error::PipFailed {
                lib_dir: target.lib_dir.clone(),
                code,
            });
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Run pip against the App's requirements file, targeting `lib_path`
async fn pip_install(python: &Path, app_path: &Path, lib_path: &Path) -> Result<i32> {
    let mut command = Command::new(python);
    command
        .args(["-m", "pip", "install", "-r", "requirements.txt"])
        .args(["--ignore-installed", "--quiet", "--target"])
        .arg(lib_path)
        .env("PYTHONPATH", lib_path)
        .current_dir(app_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    println!(
        "Running: {}",
        format!(
            "{} -m pip install -r requirements.txt --ignore-installed --quiet --target {}",
            python.display(),
            lib_path.display()
        )
        .green()
        .bold()
    );
    debug!(python = %python.display(), lib = %lib_path.display(), "running pip install");

    let output = command.output().await?;
    Ok(output.status.code().unwrap_or(1))
}

/// Query the interpreter's `major.minor.patch` version
async fn python_version(python: &Path) -> Result<String> {
    let output = Command::new(python)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await?;

    // python2 printed the version to stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    parse_python_version(&text)
        .ok_or_else(|| Error::InterpreterNotFound(python.display().to_string()))
}

/// Extract `X.Y.Z` from `Python X.Y.Z` output
fn parse_python_version(text: &str) -> Option<String> {
    let version = text.trim().strip_prefix("Python ")?.trim();
    let numeric = version
        .split('.')
        .take(3)
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if numeric && version.split('.').count() >= 3 {
        Some(version.split('.').take(3).collect::<Vec<_>>().join("."))
    } else {
        None
    }
}
