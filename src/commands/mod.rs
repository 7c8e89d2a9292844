//! Top-level subcommand orchestration.
//!
//! Each module parses nothing itself: it receives the clap options, drives
//! the mechanism and engine layers, and prints user-facing output. Errors
//! bubble up as [`anyhow::Error`] and the binary maps them to exit code 1.

pub mod apache_log;
pub mod docker_compose;
pub mod rsyslog;
pub mod rsyslog_omprog;

use anyhow::Result;

use crate::cli::ActionOpts;
use crate::diagnostics::Report;

/// Print a feasibility report as text or JSON.
pub(crate) fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

/// Reject flags that only make sense alongside `--install` or `--remove`.
pub(crate) fn require_mutating_action(
    action: &ActionOpts,
    flag_set: bool,
    flag_name: &str,
) -> Result<()> {
    if flag_set && !(action.install || action.remove) {
        anyhow::bail!("--{flag_name} requires --install or --remove");
    }
    Ok(())
}
