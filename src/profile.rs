//! Test profile generation
//!
//! Builds a run profile from an App's `install.json` manifest: the
//! standard runtime arguments, one argument per declared input parameter,
//! and - for playbook Apps - a null check and a type check for every
//! declared output variable. The result is printed, or appended to an
//! existing profile file.

use colored::Colorize;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::common::{Error, Result};
use crate::runner::config::{Profile, ValidationRule};

/// The subset of an App's `install.json` manifest the generator reads
#[derive(Debug, Deserialize)]
pub struct InstallManifest {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,

    #[serde(rename = "programMain")]
    pub program_main: String,

    #[serde(default, rename = "runtimeLevel")]
    pub runtime_level: Option<String>,

    #[serde(default)]
    pub params: Vec<InstallParam>,

    #[serde(default)]
    pub playbook: Option<PlaybookSpec>,
}

/// One declared App input parameter
#[derive(Debug, Deserialize)]
pub struct InstallParam {
    pub name: String,

    #[serde(default, rename = "type")]
    pub param_type: Option<String>,

    #[serde(default)]
    pub default: Option<Value>,
}

/// Playbook section of the manifest
#[derive(Debug, Deserialize)]
pub struct PlaybookSpec {
    #[serde(default, rename = "outputVariables")]
    pub output_variables: Vec<OutputVariable>,
}

/// One declared playbook output variable
#[derive(Debug, Deserialize)]
pub struct OutputVariable {
    pub name: String,

    #[serde(rename = "type")]
    pub variable_type: String,
}

/// Generate a profile from a manifest and print or persist it
pub fn generate(config: &Path, outfile: Option<&Path>) -> Result<()> {
    if !config.is_file() {
        return Err(Error::ConfigNotFound(config.to_path_buf()));
    }

    let content = fs::read_to_string(config).map_err(|e| Error::file_read(config, e))?;
    let manifest: InstallManifest =
        serde_json::from_str(&content).map_err(|e| Error::malformed(config, e))?;

    let profile = build_profile(&manifest, config);
    println!(
        "Building Profile: {}",
        profile.profile_name.cyan().bold()
    );

    match outfile {
        Some(path) if path.is_file() => append_profile(path, &profile),
        Some(path) => {
            println!("Create File: {}", path.display().to_string().cyan().bold());
            fs::write(path, serde_json::to_string_pretty(&json!([profile]))?)?;
            Ok(())
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
    }
}

/// Build the profile record for a manifest
pub fn build_profile(manifest: &InstallManifest, config: &Path) -> Profile {
    let mut args = standard_args();

    for param in &manifest.params {
        let is_boolean = param.param_type.as_deref() == Some("Boolean");
        let value = match (&param.default, is_boolean) {
            (Some(default), _) => default.clone(),
            (None, true) => Value::from(false),
            (None, false) => Value::from(""),
        };
        args.insert(param.name.clone(), value);
    }

    let mut profile = Profile {
        profile_name: profile_name(manifest, config),
        group: Some("qa-build".to_string()),
        script: manifest.program_main.clone(),
        args,
        exit_codes: vec![0],
        data_files: Vec::new(),
        validations: Vec::new(),
        sleep: None,
        quiet: false,
        description: Some(String::new()),
    };

    if manifest.runtime_level.as_deref() == Some("Playbook") {
        if let Some(playbook) = &manifest.playbook {
            let job_id: u32 = rand::thread_rng().gen_range(0..10_000);
            let mut output_variables = Vec::new();

            for variable in &playbook.output_variables {
                let reference =
                    format!("#App:{:04}:{}!{}", job_id, variable.name, variable.variable_type);
                output_variables.push(reference.clone());
                profile
                    .validations
                    .extend(variable_checks(&reference, &variable.variable_type));
            }

            profile.args.insert(
                "tc_playbook_out_variables".to_string(),
                Value::from(output_variables.join(",")),
            );
        }
    }

    profile
}

/// Null check and type check for one output variable
fn variable_checks(reference: &str, variable_type: &str) -> Vec<ValidationRule> {
    let null_check = if variable_type.ends_with("Array") {
        ValidationRule {
            variable: reference.to_string(),
            operator: "ni".to_string(),
            data: json!([null, []]),
        }
    } else {
        ValidationRule {
            variable: reference.to_string(),
            operator: "ne".to_string(),
            data: Value::Null,
        }
    };

    let type_tag = if variable_type.ends_with("Array") {
        "array"
    } else if variable_type.ends_with("Entity") || variable_type == "KeyValue" {
        "entity"
    } else {
        "string"
    };
    let type_check = ValidationRule {
        variable: reference.to_string(),
        operator: "it".to_string(),
        data: Value::from(type_tag),
    };

    vec![null_check, type_check]
}

/// The fixed runtime arguments every generated profile starts with
fn standard_args() -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("api_access_id".into(), Value::from("$env.API_ACCESS_ID"));
    args.insert("api_secret_key".into(), Value::from("$envs.API_SECRET_KEY"));
    args.insert("logging".into(), Value::from("debug"));
    args.insert("tc_api_path".into(), Value::from("$env.TC_API_PATH"));
    args.insert("tc_log_path".into(), Value::from("log"));
    args.insert("tc_log_to_api".into(), Value::from(false));
    args.insert("tc_out_path".into(), Value::from("log"));
    args.insert("tc_temp_path".into(), Value::from("log"));
    args.insert("tc_playbook_db_type".into(), Value::from("Redis"));
    args.insert(
        "tc_playbook_db_context".into(),
        Value::from(Uuid::new_v4().to_string()),
    );
    args.insert("tc_playbook_db_path".into(), Value::from("localhost"));
    args.insert("tc_playbook_db_port".into(), Value::from("6379"));
    args.insert("tc_playbook_out_variables".into(), Value::from(""));
    args
}

/// Derive the profile name from the display name, falling back to the
/// manifest file name
fn profile_name(manifest: &InstallManifest, config: &Path) -> String {
    let display = manifest
        .display_name
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase()
        .replace(' ', "-");
    if !display.is_empty() {
        return display;
    }

    let file_name = config
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("profile");
    file_name
        .strip_suffix(".install.json")
        .or_else(|| file_name.strip_suffix(".json"))
        .unwrap_or(file_name)
        .to_lowercase()
}

/// Append the profile to an existing profile file.
///
/// The file may be a run configuration (object with a `profiles` list)
/// or a bare profile array.
fn append_profile(path: &Path, profile: &Profile) -> Result<()> {
    println!("Append to File: {}", path.display().to_string().cyan().bold());

    let content = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    let mut data: Value =
        serde_json::from_str(&content).map_err(|e| Error::malformed(path, e))?;
    let profile_value = serde_json::to_value(profile)?;

    match &mut data {
        Value::Object(map) if map.contains_key("profiles") => match map.get_mut("profiles") {
            Some(Value::Array(profiles)) => profiles.push(profile_value),
            _ => return Err(Error::malformed(path, "'profiles' is not a list")),
        },
        Value::Array(profiles) => profiles.push(profile_value),
        _ => {
            return Err(Error::malformed(
                path,
                "expected a profile list or an object with 'profiles'",
            ))
        }
    }

    fs::write(path, serde_json::to_string_pretty(&data)?)?;
    Ok(())
}
