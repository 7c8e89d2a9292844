//! The `rsyslog` subcommand: trigger directive in rsyslog.conf.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::RsyslogOpts;
use crate::exec::SystemExecutor;
use crate::mechanisms::syslog::{self, apparmor::AppArmorProfile, directive};

use super::{print_report, require_mutating_action};

/// Run the subcommand.
///
/// # Errors
///
/// Returns an error on invalid flags or any engine/mechanism failure.
pub fn run(opts: &RsyslogOpts) -> Result<()> {
    require_mutating_action(&opts.action, opts.apparmor, "apparmor")?;
    require_mutating_action(&opts.action, opts.no_reload, "no-reload")?;

    let exec = SystemExecutor;
    let conf_path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(directive::DEFAULT_CONF_PATH));

    if opts.action.check {
        return print_report(&syslog::check(&exec), opts.action.json);
    }

    let params = directive::DirectiveParams {
        trigger: opts.trigger.clone(),
        payload: opts.payload.clone(),
    };

    if opts.action.remove {
        directive::remove(&exec, &params, &conf_path, !opts.no_reload)
            .context("remove failed")?;
        if opts.apparmor {
            AppArmorProfile::new(&exec)
                .enable()
                .context("failed to re-enable AppArmor profile")?;
        }
        println!("{}", completion_message("remove", &conf_path, opts));
        return Ok(());
    }

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
        directive::install(&exec, &params, &conf_path, !opts.no_reload)
            .context("install failed")?;
        println!("{}", completion_message("install", &conf_path, opts));
        return Ok(());
    }

    // Render-only mode.
    let fragment = directive::render(&params)?;
    if let Some(out) = &opts.output {
        std::fs::write(out, fragment.text())
            .with_context(|| format!("write {}", out.display()))?;
        println!("render complete: directive written to {}", out.display());
    } else {
        print!("{}", fragment.text());
    }
    Ok(())
}

fn completion_message(verb: &str, conf_path: &std::path::Path, opts: &RsyslogOpts) -> String {
    let action = if verb == "install" {
        format!("directive appended to {}", conf_path.display())
    } else {
        format!("directive removed from {}", conf_path.display())
    };
    let mut msg = format!("{verb} complete: {action}");
    if opts.no_reload {
        msg.push_str("; reload skipped");
    } else {
        msg.push_str("; rsyslog reloaded");
    }
    if opts.apparmor {
        if verb == "install" {
            msg.push_str("; AppArmor profile disabled");
        } else {
            msg.push_str("; AppArmor profile re-enabled");
        }
    }
    msg
}
