use std::process::ExitCode;

use clap::{CommandFactory as _, Parser as _};

use persist_cli::{cli, commands, logging};

fn main() -> ExitCode {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    let result = match &args.command {
        cli::Command::Rsyslog(opts) => commands::rsyslog::run(opts),
        cli::Command::RsyslogOmprog(opts) => commands::rsyslog_omprog::run(opts),
        cli::Command::ApacheLog(opts) => commands::apache_log::run(opts),
        cli::Command::DockerCompose(opts) => commands::docker_compose::run(opts),
        cli::Command::Completions { shell } => {
            let mut cmd = cli::Cli::command();
            clap_complete::generate(*shell, &mut cmd, "persist", &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            eprintln!("run 'persist <module> --help' for usage");
            ExitCode::FAILURE
        }
    }
}
