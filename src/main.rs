//! tiapp - profile-driven runner and tooling for platform Apps
//!
//! Runs Apps against a threat-intelligence platform using named execution
//! profiles, generates test profiles from App manifests, and installs App
//! library dependencies.

use clap::Parser;
use tiapp::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "tiapp", about = "Profile-driven runner for platform Apps")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
