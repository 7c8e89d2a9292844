//! The `docker-compose` subcommand: container autostart deployment.

use anyhow::{Context as _, Result, bail};

use crate::cli::DockerComposeOpts;
use crate::exec::SystemExecutor;
use crate::mechanisms::compose;

use super::{print_report, require_mutating_action};

/// Run the subcommand.
///
/// # Errors
///
/// Returns an error on invalid flags or any engine/mechanism failure.
pub fn run(opts: &DockerComposeOpts) -> Result<()> {
    require_mutating_action(&opts.action, opts.no_start, "no-start")?;

    let exec = SystemExecutor;

    if opts.action.check {
        return print_report(&compose::check(&exec), opts.action.json);
    }

    if opts.action.remove {
        compose::remove(&exec, &opts.output, !opts.no_start).context("remove failed")?;
        if opts.no_start {
            println!(
                "remove complete: {} removed (deployment left running)",
                compose::COMPOSE_FILE_NAME
            );
        } else {
            println!(
                "remove complete: docker compose down and {} removed",
                compose::COMPOSE_FILE_NAME
            );
        }
        return Ok(());
    }

    let Some(payload) = &opts.payload else {
        bail!("--payload is required");
    };
    let params = compose::ComposeParams {
        service_name: opts.name.clone(),
        image: opts.image.clone(),
        payload_command: payload.clone(),
    };

    if opts.action.install {
        if !compose::check(&exec).passed(compose::ACCESS_LABEL) {
            eprintln!(
                "warning: docker commands may fail (insufficient permissions or daemon unavailable)"
            );
        }
        let path = compose::install(&exec, &params, &opts.output, !opts.no_start)
            .context("install failed")?;
        if opts.no_start {
            println!("install complete: {} written (start skipped)", path.display());
        } else {
            println!(
                "install complete: {} written and docker compose up started (service {})",
                path.display(),
                opts.name
            );
        }
        return Ok(());
    }

    // Render-only mode.
    print!("{}", compose::render(&params)?.text());
    Ok(())
}
