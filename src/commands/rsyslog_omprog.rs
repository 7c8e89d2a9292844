//! The `rsyslog-omprog` subcommand: imfile/omprog drop-in.

use anyhow::{Context as _, Result};

use crate::cli::OmprogOpts;
use crate::exec::SystemExecutor;
use crate::mechanisms::syslog::{self, apparmor::AppArmorProfile, dropin};

use super::{print_report, require_mutating_action};

/// Run the subcommand.
///
/// # Errors
///
/// Returns an error on invalid flags or any engine/mechanism failure.
pub fn run(opts: &OmprogOpts) -> Result<()> {
    require_mutating_action(&opts.action, opts.apparmor, "apparmor")?;
    require_mutating_action(&opts.action, opts.no_reload, "no-reload")?;

    let exec = SystemExecutor;

    if opts.action.check {
        return print_report(&syslog::check(&exec), opts.action.json);
    }

    if opts.action.remove {
        dropin::remove(&exec, &opts.dropin, !opts.no_reload).context("remove failed")?;
        if opts.apparmor {
            AppArmorProfile::new(&exec)
                .enable()
                .context("failed to re-enable AppArmor profile")?;
        }
        let mut msg = format!(
            "remove complete: {} removed",
            opts.dropin.display()
        );
        msg.push_str(if opts.no_reload {
            "; reload skipped"
        } else {
            "; rsyslog reloaded"
        });
        if opts.apparmor {
            msg.push_str("; AppArmor profile re-enabled");
        }
        println!("{msg}");
        return Ok(());
    }

    let params = params_from(opts);

    if opts.action.install {
        if opts.apparmor {
            AppArmorProfile::new(&exec)
                .disable()
                .context("failed to disable AppArmor profile")?;
        } else if syslog::check(&exec).passed(syslog::APPARMOR_ENFORCED_LABEL) {
            eprintln!(
                "warning: rsyslog AppArmor profile is enforced; run with --apparmor to disable before install"
            );
        }
        dropin::install(&exec, &params, &opts.dropin, !opts.no_reload)
            .context("install failed")?;
        let mut msg = format!(
            "install complete: {} applied",
            opts.dropin.display()
        );
        msg.push_str(if opts.no_reload {
            "; reload skipped"
        } else {
            "; rsyslog reloaded"
        });
        if opts.apparmor {
            msg.push_str("; AppArmor profile disabled");
        }
        println!("{msg}");
        return Ok(());
    }

    // Render-only mode.
    let fragment = dropin::render(&params)?;
    if let Some(out) = &opts.outfile {
        std::fs::write(out, fragment.text())
            .with_context(|| format!("write {}", out.display()))?;
    } else {
        print!("{}", fragment.text());
    }
    Ok(())
}

/// Fixed input defaults (tag, severity, facility, polling) follow the proven
/// working configuration; only the commonly varied knobs are CLI flags.
fn params_from(opts: &OmprogOpts) -> dropin::DropInParams {
    let ruleset = if opts.no_ruleset {
        None
    } else {
        Some(opts.ruleset.clone())
    };
    dropin::DropInParams {
        input_file: opts.log_file_in.clone(),
        tag: "access".to_string(),
        severity: "info".to_string(),
        facility: "local6".to_string(),
        add_metadata: true,
        polling_interval: 10,
        state_file: String::new(),
        ruleset,
        filter_by_tag: true,
        filter_contains: opts.trigger.clone(),
        filter_regex: String::new(),
        program_path: opts.payload.clone(),
        program_args: opts.payload_args.clone(),
    }
}
