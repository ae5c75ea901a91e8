//! Run result reporting
//!
//! Accumulates one pass/fail record per executed profile and renders the
//! final summary table.

use colored::Colorize;

/// Outcome of one executed profile, immutable once recorded
#[derive(Debug, Clone)]
pub struct RunResult {
    pub profile_name: String,
    pub passed: bool,
}

/// Column width for the profile name field
const NAME_WIDTH: usize = 80;

/// Print the run summary, one line per profile
pub fn render(results: &[RunResult]) {
    println!("{}", "Reports:".cyan().bold());
    for line in render_lines(results) {
        println!("{line}");
    }
}

fn render_lines(results: &[RunResult]) -> Vec<String> {
    results
        .iter()
        .map(|result| {
            let status = if result.passed {
                "Passed".green().bold()
            } else {
                "Failed".red().bold()
            };
            format!("{:<NAME_WIDTH$}{}", result.profile_name, status)
        })
        .collect()
}
