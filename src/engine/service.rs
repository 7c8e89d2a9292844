//! Service-reload fallback chains.

use std::path::Path;

use crate::error::ServiceError;
use crate::exec::Executor;

/// Drives "reload the consumer of this configuration" over the competing
/// host tool chains.
///
/// Tools are looked up on PATH at call time and never cached. Any single
/// success short-circuits; when every fallback fails the returned error
/// aggregates each attempt's failure message.
#[derive(Debug)]
pub struct ServiceController<'a> {
    exec: &'a dyn Executor,
}

impl<'a> ServiceController<'a> {
    /// Create a controller running commands through `exec`.
    #[must_use]
    pub fn new(exec: &'a dyn Executor) -> Self {
        Self { exec }
    }

    /// Reload (or, failing that, restart) a service unit.
    ///
    /// Chain: `systemctl reload`, `systemctl restart`, `service <unit>
    /// reload`, `service <unit> restart`. Tools that are not on PATH are
    /// skipped without counting as an attempt.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoReloadTool`] when neither tool exists,
    /// [`ServiceError::ReloadFailed`] when every attempt failed.
    pub fn reload_unit(&self, unit: &str) -> Result<(), ServiceError> {
        let mut attempts: Vec<String> = Vec::new();

        if self.exec.which("systemctl") {
            for verb in ["reload", "restart"] {
                if self.attempt(&mut attempts, "systemctl", &[verb, unit]) {
                    return Ok(());
                }
            }
        }
        if self.exec.which("service") {
            for verb in ["reload", "restart"] {
                if self.attempt(&mut attempts, "service", &[unit, verb]) {
                    return Ok(());
                }
            }
        }

        if attempts.is_empty() {
            Err(ServiceError::NoReloadTool {
                subject: unit.to_string(),
            })
        } else {
            Err(ServiceError::ReloadFailed {
                subject: unit.to_string(),
                detail: attempts.join("; "),
            })
        }
    }

    /// Run a compose verb against a compose file, trying `docker compose`
    /// first and falling back to the standalone `docker-compose` binary.
    ///
    /// The command runs in the compose file's directory so relative lookups
    /// behave the way `docker compose` expects.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoComposeTool`] when neither command exists,
    /// [`ServiceError::ComposeFailed`] when every attempt failed.
    pub fn compose(&self, compose_file: &Path, args: &[&str]) -> Result<(), ServiceError> {
        let action = args.first().copied().unwrap_or("up").to_string();
        let dir = compose_file.parent().unwrap_or_else(|| Path::new("."));
        let file_name = compose_file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("docker-compose.yml");

        let mut attempts: Vec<String> = Vec::new();

        if self.exec.which("docker") {
            let mut cmd_args = vec!["compose", "-f", file_name];
            cmd_args.extend_from_slice(args);
            if self.attempt_in(&mut attempts, dir, "docker", &cmd_args) {
                return Ok(());
            }
        }
        if self.exec.which("docker-compose") {
            let mut cmd_args = vec!["-f", file_name];
            cmd_args.extend_from_slice(args);
            if self.attempt_in(&mut attempts, dir, "docker-compose", &cmd_args) {
                return Ok(());
            }
        }

        if attempts.is_empty() {
            Err(ServiceError::NoComposeTool)
        } else {
            Err(ServiceError::ComposeFailed {
                action,
                detail: attempts.join("; "),
            })
        }
    }

    fn attempt(&self, attempts: &mut Vec<String>, program: &str, args: &[&str]) -> bool {
        tracing::debug!("trying {program} {}", args.join(" "));
        match self.exec.run_unchecked(program, args) {
            Ok(result) if result.success => true,
            Ok(result) => {
                attempts.push(format!(
                    "{program} {}: {}",
                    args.join(" "),
                    nonempty(&result.combined())
                ));
                false
            }
            Err(err) => {
                attempts.push(format!("{program} {}: {err}", args.join(" ")));
                false
            }
        }
    }

    fn attempt_in(
        &self,
        attempts: &mut Vec<String>,
        dir: &Path,
        program: &str,
        args: &[&str],
    ) -> bool {
        tracing::debug!("trying {program} {} in {}", args.join(" "), dir.display());
        match self.exec.run_in_unchecked(dir, program, args) {
            Ok(result) if result.success => true,
            Ok(result) => {
                attempts.push(format!(
                    "{program} {}: {}",
                    args.join(" "),
                    nonempty(&result.combined())
                ));
                false
            }
            Err(err) => {
                attempts.push(format!("{program} {}: {err}", args.join(" ")));
                false
            }
        }
    }
}

fn nonempty(message: &str) -> &str {
    if message.is_empty() {
        "exited non-zero"
    } else {
        message
    }
}
