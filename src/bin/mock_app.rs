//! Mock App binary for integration testing
//!
//! Stands in for both the App interpreter and the staging helper so the
//! integration suite can drive the runner without a platform install.
//!
//! Helper mode (argv contains `--data_file`): exits with
//! `MOCK_STAGE_EXIT` (or `MOCK_VALIDATE_EXIT` when `--validate` is also
//! present), defaulting to 0.
//!
//! App mode: echoes its argv to stdout, writes to stderr when
//! `--mock_stderr` is passed, and exits with the value following
//! `--mock_exit_code` (default 0).

use std::env;
use std::process::exit;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--data_file") {
        let var = if args.iter().any(|arg| arg == "--validate") {
            "MOCK_VALIDATE_EXIT"
        } else {
            "MOCK_STAGE_EXIT"
        };
        let code = env::var(var)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        exit(code);
    }

    println!("mock-app argv: {}", args.join(" "));

    if args.iter().any(|arg| arg == "--mock_stderr") {
        eprintln!("mock-app stderr output");
    }

    let code = args
        .iter()
        .position(|arg| arg == "--mock_exit_code")
        .and_then(|pos| args.get(pos + 1))
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    exit(code);
}
