//! Command-line surface: one subcommand per persistence mechanism.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mechanisms::{apache, compose};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "persist",
    about = "Log-triggered and container-based persistence installer for Linux hosts",
    version = option_env!("PERSIST_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available persistence modules.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Triggerable rsyslog filter appended to rsyslog.conf (shell execute)
    Rsyslog(RsyslogOpts),
    /// Triggerable rsyslog filter using an imfile + omprog drop-in
    RsyslogOmprog(OmprogOpts),
    /// Autostart persistence via an Apache logging pipe
    ApacheLog(ApacheLogOpts),
    /// Autostart persistence via a docker compose deployment
    DockerCompose(DockerComposeOpts),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// The mutually exclusive action selector shared by every mechanism. With no
/// action the mechanism renders its fragment and prints it.
#[derive(Args, Debug, Clone, Default)]
pub struct ActionOpts {
    /// Check system feasibility and exit
    #[arg(long, group = "action")]
    pub check: bool,

    /// Install the persistence configuration
    #[arg(long, group = "action")]
    pub install: bool,

    /// Remove the persistence configuration
    #[arg(long, group = "action")]
    pub remove: bool,

    /// Print the check report as JSON
    #[arg(long, requires = "check")]
    pub json: bool,
}

/// Options for the `rsyslog` module.
#[derive(Args, Debug, Clone)]
pub struct RsyslogOpts {
    #[command(flatten)]
    pub action: ActionOpts,

    /// Message substring to trigger on
    #[arg(short, long, default_value = "hacker")]
    pub trigger: String,

    /// Payload binary to execute via shell
    #[arg(short, long, default_value = "/usr/bin/touch /tmp/persist")]
    pub payload: String,

    /// rsyslog configuration file to append to (also the render-only output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Manage the rsyslog AppArmor profile (disable on install, re-enable on remove)
    #[arg(long)]
    pub apparmor: bool,

    /// Skip reloading rsyslog after changes
    #[arg(long)]
    pub no_reload: bool,
}

/// Options for the `rsyslog-omprog` module.
#[derive(Args, Debug, Clone)]
pub struct OmprogOpts {
    #[command(flatten)]
    pub action: ActionOpts,

    /// Log file to monitor (imfile)
    #[arg(short = 'l', long, default_value = "/var/log/auth.log")]
    pub log_file_in: String,

    /// Payload binary to execute (omprog)
    #[arg(short, long, default_value = "/usr/bin/touch /tmp/persist")]
    pub payload: String,

    /// Optional arguments for the payload binary
    #[arg(long, default_value = "")]
    pub payload_args: String,

    /// Message substring to trigger on
    #[arg(short, long, default_value = "uhtavi0")]
    pub trigger: String,

    /// Write the rendered config to this file (render-only mode; default stdout)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// Ruleset wrapping the filter and action for isolation
    #[arg(long, default_value = "event_router")]
    pub ruleset: String,

    /// Emit the filter and action at top level instead of inside a ruleset
    #[arg(long)]
    pub no_ruleset: bool,

    /// Drop-in file to install to
    #[arg(long, default_value = crate::mechanisms::syslog::dropin::DEFAULT_DROP_IN_PATH)]
    pub dropin: PathBuf,

    /// Manage the rsyslog AppArmor profile (disable on install, re-enable on remove)
    #[arg(long)]
    pub apparmor: bool,

    /// Skip reloading rsyslog after changes
    #[arg(long)]
    pub no_reload: bool,
}

/// Options for the `apache-log` module.
#[derive(Args, Debug, Clone)]
pub struct ApacheLogOpts {
    #[command(flatten)]
    pub action: ActionOpts,

    /// Path to executable payload invoked via CustomLog
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Path to apache2.conf
    #[arg(short, long, default_value = apache::DEFAULT_CONF_PATH)]
    pub conf: PathBuf,

    /// Skip restarting the apache2 service after changes
    #[arg(long)]
    pub no_restart: bool,
}

/// Options for the `docker-compose` module.
#[derive(Args, Debug, Clone)]
pub struct DockerComposeOpts {
    #[command(flatten)]
    pub action: ActionOpts,

    /// Path to the payload on the HOST filesystem
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Container image to launch, pulled if required
    #[arg(short, long, default_value = "alpine:latest")]
    pub image: String,

    /// Service/container name for docker compose
    #[arg(short, long, default_value = "persist-compose")]
    pub name: String,

    /// Directory to place docker-compose.yml in
    #[arg(short, long, default_value = compose::DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Skip starting (install) or stopping (remove) the deployment
    #[arg(long)]
    pub no_start: bool,
}
