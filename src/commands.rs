//! CLI command definitions
//!
//! Defines the clap commands for the tiapp CLI. Flag names keep the
//! underscore spelling the platform tooling has always used, so existing
//! build scripts keep working.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one or more App profiles from a run configuration
    Run {
        /// The run configuration file
        #[arg(long, default_value = "tcex.json")]
        config: PathBuf,

        /// Halt on any profile failure
        #[arg(long = "halt_on_fail")]
        halt_on_fail: bool,

        /// The group of profiles to execute
        #[arg(long)]
        group: Option<String>,

        /// The profile to execute
        #[arg(long, default_value = "default")]
        profile: String,

        /// Suppress App output
        #[arg(long)]
        quiet: bool,

        /// Show masked args in clear text
        #[arg(long)]
        unmask: bool,

        /// Interpreter used to launch the App script
        #[arg(long, default_value = "python3")]
        interpreter: String,

        /// App directory (defaults to the current directory)
        #[arg(long = "app_path")]
        app_path: Option<PathBuf>,
    },

    /// Generate a test profile from an App's install.json manifest
    Profile {
        /// The App manifest file
        #[arg(long, default_value = "install.json")]
        config: PathBuf,

        /// File to create or append the profile to (prints to stdout when omitted)
        #[arg(long)]
        outfile: Option<PathBuf>,
    },

    /// Install App library dependencies into versioned lib directories
    Deps {
        /// Name of the App (defaults to the App directory name)
        #[arg(long = "app_name")]
        app_name: Option<String>,

        /// Fully qualified path of the App
        #[arg(long = "app_path")]
        app_path: Option<PathBuf>,

        /// Run configuration declaring multiple lib_versions targets
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
