//! The `apache-log` subcommand: CustomLog pipe in apache2.conf.

use anyhow::{Context as _, Result, bail};

use crate::cli::ApacheLogOpts;
use crate::exec::SystemExecutor;
use crate::mechanisms::apache;

use super::{print_report, require_mutating_action};

/// Run the subcommand.
///
/// # Errors
///
/// Returns an error on invalid flags or any engine/mechanism failure.
pub fn run(opts: &ApacheLogOpts) -> Result<()> {
    require_mutating_action(&opts.action, opts.no_restart, "no-restart")?;

    let exec = SystemExecutor;
    let restart = !opts.no_restart;

    if opts.action.check {
        return print_report(&apache::check(&exec, &opts.conf), opts.action.json);
    }

    if opts.action.remove {
        apache::remove(&exec, &opts.conf, restart).context("remove failed")?;
        let mut msg = format!(
            "remove complete: apache-log snippet removed from {}",
            opts.conf.display()
        );
        msg.push_str(if restart {
            "; apache2 restarted"
        } else {
            "; restart skipped"
        });
        println!("{msg}");
        return Ok(());
    }

    let Some(payload) = &opts.payload else {
        bail!("--payload is required");
    };
    let params = apache::PipeParams {
        payload: payload.clone(),
    };

    if opts.action.install {
        apache::install(&exec, &params, &opts.conf, restart).context("install failed")?;
        let mut msg = format!(
            "install complete: apache-log CustomLog pipe appended to {}",
            opts.conf.display()
        );
        msg.push_str(if restart {
            "; apache2 restarted"
        } else {
            "; restart skipped"
        });
        println!("{msg}");
        return Ok(());
    }

    // Render-only mode.
    print!("{}", apache::render(&params)?.text());
    Ok(())
}
