//! End-to-end integration tests for the tiapp CLI
//!
//! Each test builds a throwaway App directory (run config, dummy script,
//! data files), then runs the real `tiapp` binary against it with the
//! `mock-app` binary standing in for both the interpreter and the
//! staging helper.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway App directory plus the binaries under test
struct TestApp {
    dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp app dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tiapp_bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_tiapp"))
    }

    fn mock_app_bin() -> String {
        env!("CARGO_BIN_EXE_mock-app").to_string()
    }

    /// Write the run configuration, pointing the helper at mock-app
    fn write_config(&self, profiles: Value) {
        let config = json!({
            "profiles": profiles,
            "helper": Self::mock_app_bin(),
        });
        fs::write(
            self.path().join("tcex.json"),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
    }

    /// Create the script file the runner requires to exist
    fn write_script(&self, name: &str) {
        fs::write(self.path().join(name), "# placeholder App entry point\n").unwrap();
    }

    /// Run `tiapp run` with extra flags and optional env vars
    fn run(&self, extra_args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut command = Command::new(Self::tiapp_bin());
        command
            .arg("run")
            .args(["--config", "tcex.json"])
            .args(["--interpreter", &Self::mock_app_bin()])
            .args(extra_args)
            .current_dir(self.path());
        for (key, value) in envs {
            command.env(key, value);
        }
        command.output().expect("run tiapp")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn passing_profile_reports_passed_and_exits_zero() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"flag": true},
        "exit_codes": [0]
    }]));

    let output = app.run(&[], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Profile: default"));
    assert!(out.contains("App Exit Code: 0"));
    assert!(out.contains("Passed"));
    // the flag arg made it to the App
    assert!(out.contains("mock-app argv:"));
    assert!(out.contains("--flag"));
}

#[test]
fn failing_exit_code_reports_failed_and_exits_one() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"mock_exit_code": "3"}
    }]));

    let output = app.run(&[], &[]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("App Exit Code: 3"));
    assert!(out.contains("Valid Exit Codes"));
    assert!(out.contains("Failed"));
}

#[test]
fn nonzero_exit_code_can_be_declared_valid() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"mock_exit_code": "3"},
        "exit_codes": [0, 3]
    }]));

    let output = app.run(&[], &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Passed"));
}

#[test]
fn halt_on_fail_skips_remaining_profiles() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([
        {
            "profile_name": "first",
            "group": "qa",
            "script": "run",
            "args": {"mock_exit_code": "3"}
        },
        {
            "profile_name": "second",
            "group": "qa",
            "script": "run",
            "sleep": 0
        }
    ]));

    let output = app.run(&["--group", "qa", "--halt_on_fail"], &[]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("Profile: first"));
    assert!(!out.contains("Profile: second"));
}

#[test]
fn group_selection_runs_all_members_without_halt() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([
        {
            "profile_name": "first",
            "group": "qa",
            "script": "run",
            "args": {"mock_exit_code": "3"}
        },
        {
            "profile_name": "second",
            "group": "qa",
            "script": "run",
            "sleep": 0
        }
    ]));

    let output = app.run(&["--group", "qa"], &[]);

    // overall failure even though the second profile passed
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("Profile: first"));
    assert!(out.contains("Profile: second"));
    assert!(out.contains("Failed"));
    assert!(out.contains("Passed"));
}

#[test]
fn secret_args_are_masked_in_output_but_passed_in_clear() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"token": "$envs.TIAPP_IT_SECRET"}
    }]));

    let output = app.run(&[], &[("TIAPP_IT_SECRET", "abcd")]);

    assert!(output.status.success());
    let out = stdout(&output);
    let executing = out
        .lines()
        .find(|line| line.contains("Executing:"))
        .expect("invocation line printed");
    assert!(executing.contains("xxxx"), "line: {executing}");
    assert!(!executing.contains("abcd"), "line: {executing}");
    // the App itself received the clear value
    let argv = out
        .lines()
        .find(|line| line.contains("mock-app argv:"))
        .expect("App output printed");
    assert!(argv.contains("abcd"));
}

#[test]
fn unmask_shows_secret_in_invocation_line() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"token": "$envs.TIAPP_IT_UNMASK"}
    }]));

    let output = app.run(&["--unmask"], &[("TIAPP_IT_UNMASK", "abcd")]);

    let executing = stdout(&output)
        .lines()
        .find(|line| line.contains("Executing:"))
        .expect("invocation line printed")
        .to_string();
    assert!(executing.contains("abcd"));
}

#[test]
fn missing_data_file_aborts_before_running_the_script() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "data_files": ["missing.json"]
    }]));

    let output = app.run(&[], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Could not find data file"));
    assert!(!stdout(&output).contains("Executing:"));
}

#[test]
fn staging_failure_propagates_the_helper_exit_code() {
    let app = TestApp::new();
    app.write_script("run.py");
    fs::write(app.path().join("data.json"), "{}").unwrap();
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "data_files": ["data.json"]
    }]));

    let output = app.run(&[], &[("MOCK_STAGE_EXIT", "5")]);

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("Failed to stage data"));
}

#[test]
fn validation_failure_propagates_the_helper_exit_code() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "validations": [
            {"variable": "#App:0001:url!String", "operator": "ne", "data": null}
        ]
    }]));

    let output = app.run(&[], &[("MOCK_VALIDATE_EXIT", "7")]);

    assert_eq!(output.status.code(), Some(7));
    assert!(stderr(&output).contains("Failed variable validation"));
    let out = stdout(&output);
    assert!(out.contains("Validating Variables:"));
    assert!(out.contains("#App:0001:url!String"));
}

#[test]
fn passing_validation_does_not_fail_the_run() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "validations": [
            {"variable": "#App:0001:url!String", "operator": "ne", "data": null}
        ]
    }]));

    let output = app.run(&[], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Passed"));
}

#[test]
fn missing_script_aborts_the_whole_run() {
    let app = TestApp::new();
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run"
    }]));

    let output = app.run(&[], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Could not find script"));
}

#[test]
fn missing_config_file_is_fatal() {
    let app = TestApp::new();

    let output = app.run(&[], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn no_matching_profile_warns_and_exits_zero() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run"
    }]));

    let output = app.run(&["--profile", "nope"], &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No profiles selected to run."));
}

#[test]
fn quiet_suppresses_app_stdout() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run"
    }]));

    let output = app.run(&["--quiet"], &[]);

    assert!(output.status.success());
    assert!(!stdout(&output).contains("mock-app argv:"));
}

#[test]
fn app_stderr_is_forwarded() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"mock_stderr": true}
    }]));

    let output = app.run(&[], &[]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("mock-app stderr output"));
}

#[test]
fn include_dir_profiles_are_runnable() {
    let app = TestApp::new();
    app.write_script("run.py");
    let includes = app.path().join("profiles");
    fs::create_dir(&includes).unwrap();
    fs::write(
        includes.join("extra.json"),
        serde_json::to_string(&json!([{
            "profile_name": "included",
            "script": "run"
        }]))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        app.path().join("tcex.json"),
        serde_json::to_string(&json!({
            "profiles": [],
            "profile_include_dirs": ["profiles"],
            "helper": TestApp::mock_app_bin(),
        }))
        .unwrap(),
    )
    .unwrap();

    let output = app.run(&["--profile", "included"], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Profile: included"));
}

#[test]
fn declared_directories_are_created() {
    let app = TestApp::new();
    app.write_script("run.py");
    app.write_config(json!([{
        "profile_name": "default",
        "script": "run",
        "args": {"tc_log_path": "log", "tc_out_path": "out", "tc_temp_path": "tmp"}
    }]));

    let output = app.run(&[], &[]);

    assert!(output.status.success());
    assert!(app.path().join("log").is_dir());
    assert!(app.path().join("out").is_dir());
    assert!(app.path().join("tmp").is_dir());
}

#[test]
fn profile_command_appends_to_run_config() {
    let app = TestApp::new();
    fs::write(
        app.path().join("install.json"),
        serde_json::to_string(&json!({
            "displayName": "Example App",
            "programMain": "run.py",
            "runtimeLevel": "Playbook",
            "params": [{"name": "deep_scan", "type": "Boolean"}],
            "playbook": {"outputVariables": [{"name": "url", "type": "String"}]}
        }))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        app.path().join("tcex.json"),
        serde_json::to_string(&json!({"profiles": []})).unwrap(),
    )
    .unwrap();

    let output = Command::new(TestApp::tiapp_bin())
        .args(["profile", "--config", "install.json", "--outfile", "tcex.json"])
        .current_dir(app.path())
        .output()
        .expect("run tiapp profile");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let written: Value =
        serde_json::from_str(&fs::read_to_string(app.path().join("tcex.json")).unwrap())
            .unwrap();
    let profiles = written["profiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["profile_name"], "example-app");
    assert_eq!(profiles[0]["group"], "qa-build");
    // one null check and one type check for the single output variable
    assert_eq!(profiles[0]["validations"].as_array().unwrap().len(), 2);
}

#[test]
fn profile_command_prints_to_stdout_without_outfile() {
    let app = TestApp::new();
    fs::write(
        app.path().join("install.json"),
        serde_json::to_string(&json!({
            "displayName": "Print App",
            "programMain": "run.py"
        }))
        .unwrap(),
    )
    .unwrap();

    let output = Command::new(TestApp::tiapp_bin())
        .args(["profile", "--config", "install.json"])
        .current_dir(app.path())
        .output()
        .expect("run tiapp profile");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Building Profile:"));
    assert!(out.contains("\"profile_name\": \"print-app\""));
}
