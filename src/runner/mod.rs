//! Profile execution engine
//!
//! Runs the selected profiles one at a time, in selection order: stage
//! declared data, launch the App under the configured interpreter with
//! the resolved arguments, classify its exit code, run output
//! validations, and record the result for the final report.
//!
//! Fatal conditions (missing config, script, or data file; helper
//! failures) abort the whole run. An exit-code mismatch is the only
//! non-fatal failure: it is recorded, optionally halts the remaining
//! profiles, and surfaces in the process exit status.

pub mod config;
pub mod params;
pub mod report;
pub mod staging;

use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::common::{Error, Result};
use config::Profile;
use report::RunResult;

/// Options for one `tiapp run` invocation
#[derive(Debug)]
pub struct RunOptions {
    /// Run configuration file
    pub config: PathBuf,
    /// Stop before the next profile after any failure
    pub halt_on_fail: bool,
    /// Group tag to select
    pub group: Option<String>,
    /// Profile name to select
    pub profile: String,
    /// Suppress App stdout
    pub quiet: bool,
    /// Show masked args in clear text
    pub unmask: bool,
    /// Interpreter used to launch App scripts
    pub interpreter: String,
    /// App directory; config includes, data files, and scripts resolve
    /// against it and spawned processes run inside it
    pub app_path: PathBuf,
}

/// Execute the selected profiles and return their results.
///
/// The process exit status is derived by the caller: non-empty results
/// with any failure mean exit 1.
pub async fn run(options: RunOptions) -> Result<Vec<RunResult>> {
    let run_config = config::load(&options.config, &options.app_path)?;

    let selected = select_profiles(
        &run_config.profiles,
        &options.profile,
        options.group.as_deref(),
    );

    if selected.is_empty() {
        println!("{}", "No profiles selected to run.".yellow().bold());
        return Ok(Vec::new());
    }

    let interpreter = resolve_interpreter(&options.interpreter)?;
    let helper = run_config.helper.as_deref().unwrap_or(staging::DEFAULT_HELPER);

    let mut results: Vec<RunResult> = Vec::new();
    for (index, profile) in selected.iter().enumerate() {
        create_app_dirs(profile, &options.app_path)?;

        if index > 0 {
            let sleep = profile.sleep.or(run_config.sleep).unwrap_or(1);
            println!("Sleep: {}", format!("{sleep} seconds").cyan().bold());
            tokio::time::sleep(Duration::from_secs(sleep)).await;
        }

        println!("Profile: {}", profile.profile_name.cyan().bold());
        if let Some(description) = &profile.description {
            if !description.is_empty() {
                println!("Description: {}", description.magenta().bold());
            }
        }

        // The script must exist before anything runs; its absence aborts
        // the whole run, not just this profile.
        let script_file = if profile.script.ends_with(".py") {
            profile.script.clone()
        } else {
            format!("{}.py", profile.script)
        };
        if !options.app_path.join(&script_file).is_file() {
            return Err(Error::ScriptNotFound(script_file));
        }
        let script_stem = script_file.trim_end_matches(".py");

        staging::stage_data(profile, &options.app_path, helper).await?;

        let params = params::resolve(&profile.args, options.unmask)?;
        let command_prefix = [
            interpreter.display().to_string(),
            options.app_path.display().to_string(),
            script_stem.to_string(),
        ];

        let display_line = command_prefix
            .iter()
            .cloned()
            .chain(params.masked.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        println!("Executing: {}", display_line.green().bold());

        debug!(script = script_stem, "launching App");
        let output = Command::new(&interpreter)
            .arg(&options.app_path)
            .arg(script_stem)
            .args(&params.unmasked)
            .current_dir(&options.app_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let code = output.status.code().unwrap_or(1);
        let passed = profile.exit_codes.contains(&code);
        if passed {
            println!("App Exit Code: {}", code.to_string().green().bold());
        } else {
            println!(
                "App Exit Code: {} (Valid Exit Codes: {:?})",
                code.to_string().red().bold(),
                profile.exit_codes
            );
        }

        // Validations run whether or not the exit code matched.
        staging::validate_data(profile, &options.app_path, helper).await?;

        println!("{}", "-".repeat(100).bold());

        if !profile.quiet && !options.quiet {
            print!("{}", String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            eprint!("{}", String::from_utf8_lossy(&output.stderr));
        }

        results.push(RunResult {
            profile_name: profile.profile_name.clone(),
            passed,
        });

        if !passed && options.halt_on_fail {
            break;
        }
    }

    report::render(&results);
    Ok(results)
}

/// Select the profiles to execute, in declaration order.
///
/// A profile is selected when its name matches the requested profile or
/// its group tag matches the requested group; a profile satisfying both
/// is selected once.
fn select_profiles<'a>(profiles: &'a [Profile], name: &str, group: Option<&str>) -> Vec<&'a Profile> {
    profiles
        .iter()
        .filter(|p| p.profile_name == name || (p.group.is_some() && p.group.as_deref() == group))
        .collect()
}

/// Resolve the interpreter: an existing path wins, otherwise PATH
fn resolve_interpreter(interpreter: &str) -> Result<PathBuf> {
    let path = Path::new(interpreter);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    which::which(interpreter).map_err(|_| Error::InterpreterNotFound(interpreter.to_string()))
}

/// Create the profile's declared log/out/temp directories, idempotently
fn create_app_dirs(profile: &Profile, app_path: &Path) -> Result<()> {
    for key in ["tc_log_path", "tc_out_path", "tc_temp_path"] {
        if let Some(serde_json::Value::String(dir)) = profile.args.get(key) {
            let path = app_path.join(dir);
            if !path.is_dir() {
                fs::create_dir_all(&path)?;
            }
        }
    }
    Ok(())
}
