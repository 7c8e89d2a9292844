//! The legacy-format trigger directive appended to `rsyslog.conf`.
//!
//! One rendered line, `:msg, contains, "TRIGGER" ^PAYLOAD`, executes the
//! payload whenever a logged message contains the trigger substring. The
//! directive is located for removal by exact line match: a line with a
//! different payload or trigger is a different installation.

use std::path::Path;

use crate::engine::{Fragment, Installer, ReloadPlan, Target};
use crate::error::{EngineError, ValidationError};
use crate::exec::Executor;

use super::{SERVICE_UNIT, escape_value};

/// The canonical rsyslog configuration file this mechanism appends to. The
/// file is externally owned and must already exist.
pub const DEFAULT_CONF_PATH: &str = "/etc/rsyslog.conf";

/// Parameters for the trigger directive.
#[derive(Debug, Clone)]
pub struct DirectiveParams {
    /// Message substring that triggers the payload.
    pub trigger: String,
    /// Program executed when the trigger matches.
    pub payload: String,
}

impl DirectiveParams {
    /// Check required fields and reject values that would break out of the
    /// directive syntax.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for empty or newline-containing fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.trigger.trim().is_empty() {
            return Err(ValidationError::Required { field: "trigger" });
        }
        if self.payload.trim().is_empty() {
            return Err(ValidationError::Required { field: "payload" });
        }
        if self.trigger.contains('\n') {
            return Err(ValidationError::EmbeddedNewline { field: "trigger" });
        }
        if self.payload.contains('\n') {
            return Err(ValidationError::EmbeddedNewline { field: "payload" });
        }
        Ok(())
    }
}

/// Render the directive fragment.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the parameters are invalid; no I/O is
/// performed.
pub fn render(params: &DirectiveParams) -> Result<Fragment, ValidationError> {
    params.validate()?;
    let line = format!(
        ":msg, contains, \"{}\" ^{}",
        escape_value(params.trigger.trim()),
        params.payload.trim()
    );
    Ok(Fragment::line(&line))
}

/// Append the directive to `conf_path` and reload rsyslog.
///
/// # Errors
///
/// Propagates validation, idempotency, privilege, I/O and reload errors from
/// the engine.
pub fn install(
    exec: &dyn Executor,
    params: &DirectiveParams,
    conf_path: &Path,
    reload: bool,
) -> Result<(), EngineError> {
    let fragment = render(params)?;
    let plan = reload.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).install(&Target::external(conf_path), &fragment, plan.as_ref())
}

/// Remove the directive rendered from `params` from `conf_path` and reload
/// rsyslog.
///
/// # Errors
///
/// Propagates validation, idempotency, privilege, I/O and reload errors from
/// the engine.
pub fn remove(
    exec: &dyn Executor,
    params: &DirectiveParams,
    conf_path: &Path,
    reload: bool,
) -> Result<(), EngineError> {
    let fragment = render(params)?;
    let plan = reload.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).remove(&Target::external(conf_path), fragment.matcher(), plan.as_ref())
}
