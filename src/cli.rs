//! CLI command handling
//!
//! Dispatches parsed commands to the runner, profile generator, and
//! dependency installer.

use std::env;

use crate::commands::Commands;
use crate::common::Result;
use crate::deps::{self, DepsOptions};
use crate::profile;
use crate::runner::{self, RunOptions};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            halt_on_fail,
            group,
            profile,
            quiet,
            unmask,
            interpreter,
            app_path,
        } => {
            let app_path = match app_path {
                Some(path) => path,
                None => env::current_dir()?,
            };
            let results = runner::run(RunOptions {
                config,
                halt_on_fail,
                group,
                profile,
                quiet,
                unmask,
                interpreter,
                app_path,
            })
            .await?;

            // Overall run status: any recorded failure fails the process,
            // whether or not halt-on-fail cut the run short.
            if results.iter().any(|result| !result.passed) {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Profile { config, outfile } => profile::generate(&config, outfile.as_deref()),

        Commands::Deps {
            app_name,
            app_path,
            config,
        } => {
            let app_path = match app_path {
                Some(path) => path,
                None => env::current_dir()?,
            };
            deps::install(DepsOptions {
                app_name,
                app_path,
                config,
            })
            .await
        }
    }
}
