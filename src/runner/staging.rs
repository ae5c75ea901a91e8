//! Data staging and output validation
//!
//! Both steps shell out to the platform's staging helper (`tcdata` unless
//! the run config overrides it). The helper only needs the runtime subset
//! of the profile's arguments: credentials, logging, API path, storage
//! paths, and the playbook datastore coordinates.

use colored::Colorize;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::common::{Error, Result};
use crate::runner::config::Profile;
use crate::runner::params;

/// Default staging/validation helper executable
pub const DEFAULT_HELPER: &str = "tcdata";

/// Profile argument keys forwarded to the helper, in emission order
const DATA_ARG_KEYS: [&str; 11] = [
    "api_access_id",
    "api_secret_key",
    "logging",
    "tc_api_path",
    "tc_log_path",
    "tc_out_path",
    "tc_playbook_db_context",
    "tc_playbook_db_path",
    "tc_playbook_db_port",
    "tc_playbook_db_type",
    "tc_temp_path",
];

/// Build the runtime argument subset passed to the helper.
///
/// The helper writes its own log, so `tc_log_file` is pinned rather than
/// inherited from the profile.
pub fn data_args(args: &Map<String, Value>) -> Map<String, Value> {
    let mut data = Map::new();
    for key in DATA_ARG_KEYS {
        if key == "tc_log_path" {
            data.insert("tc_log_file".to_string(), Value::from("data.log"));
        }
        if let Some(value) = args.get(key) {
            data.insert(key.to_string(), value.clone());
        }
    }
    data
}

/// Resolve the helper executable: an existing path wins, otherwise PATH
fn resolve_helper(helper: &str) -> Result<PathBuf> {
    let path = Path::new(helper);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    which::which(helper).map_err(|_| Error::HelperNotFound(helper.to_string()))
}

/// Stage each of a profile's declared data files through the helper.
///
/// Every file must exist before its helper invocation; a missing file or
/// a non-zero helper exit aborts the whole run.
pub async fn stage_data(profile: &Profile, app_path: &Path, helper: &str) -> Result<()> {
    if profile.data_files.is_empty() {
        return Ok(());
    }

    let helper = resolve_helper(helper)?;
    let params = params::resolve(&data_args(&profile.args), false)?;

    for file in &profile.data_files {
        if !app_path.join(file).is_file() {
            return Err(Error::DataFileNotFound(file.clone()));
        }

        println!(
            "Staging Data: {}",
            file.display().to_string().cyan().bold()
        );

        let code = run_helper(&helper, app_path, &["--data_file".into(), file.display().to_string()], &params.unmasked)
            .await?;
        if code != 0 {
            return Err(Error::StagingFailed {
                file: file.clone(),
                code,
            });
        }
    }

    Ok(())
}

/// Run a profile's output validations through the helper.
///
/// The rule list is serialized to a transient file handed to the helper
/// with `--validate`; the file is removed when the guard drops, whatever
/// the outcome.
pub async fn validate_data(profile: &Profile, app_path: &Path, helper: &str) -> Result<()> {
    if profile.validations.is_empty() {
        return Ok(());
    }

    let helper = resolve_helper(helper)?;
    let params = params::resolve(&data_args(&profile.args), false)?;

    let variables: Vec<&str> = profile
        .validations
        .iter()
        .map(|rule| rule.variable.as_str())
        .collect();
    println!(
        "Validating Variables: {}",
        variables.join(", ").cyan().bold()
    );

    let mut rule_file = tempfile::NamedTempFile::new()?;
    rule_file.write_all(serde_json::to_string(&profile.validations)?.as_bytes())?;
    rule_file.flush()?;

    let code = run_helper(
        &helper,
        app_path,
        &[
            "--data_file".into(),
            rule_file.path().display().to_string(),
            "--validate".into(),
        ],
        &params.unmasked,
    )
    .await?;

    if code != 0 {
        return Err(Error::ValidationFailed { code });
    }

    Ok(())
}

/// Invoke the helper and return its exit code
async fn run_helper(
    helper: &Path,
    app_path: &Path,
    mode_args: &[String],
    params: &[String],
) -> Result<i32> {
    debug!(helper = %helper.display(), ?mode_args, "invoking staging helper");

    let output = Command::new(helper)
        .args(mode_args)
        .args(params)
        .current_dir(app_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    Ok(output.status.code().unwrap_or(1))
}
