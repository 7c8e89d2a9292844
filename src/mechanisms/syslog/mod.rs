//! rsyslog-based persistence: the legacy trigger directive appended to
//! `rsyslog.conf` and the imfile/omprog drop-in, plus the AppArmor profile
//! toggle and the shared feasibility check.

pub mod apparmor;
pub mod directive;
pub mod dropin;

use crate::diagnostics::{Probe, Report, path_exists};
use crate::exec::Executor;

/// Service unit reloaded after configuration changes.
pub const SERVICE_UNIT: &str = "rsyslog";

/// Report label for the AppArmor enforcement check, queried by the install
/// flow to warn when the profile would block omprog/shell execution.
pub const APPARMOR_ENFORCED_LABEL: &str = "AppArmor enforced for rsyslog";

/// Escape a value for embedding in a quoted RainerScript string.
///
/// Backslashes are escaped before quotes, in that order, so quote escapes are
/// not themselves double-escaped.
pub(crate) fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Probe the host for rsyslog feasibility: is rsyslog installed and running,
/// is AppArmor present, and is rsyslogd confined by it.
#[must_use]
pub fn check(exec: &dyn Executor) -> Report {
    let probe = Probe::new(exec);
    let mut report = Report::new();

    let installed = check_installed(&probe, exec, &mut report);
    report.check("rsyslog installed", installed);

    let running = check_running(&probe, &mut report);
    report.check("rsyslog running", running);

    let apparmor = check_apparmor_installed(&probe, &mut report);
    report.check("AppArmor installed", apparmor);

    let enforced = apparmor && running && check_apparmor_enforced(&probe, &mut report);
    report.check(APPARMOR_ENFORCED_LABEL, enforced);

    report
}

fn check_installed(probe: &Probe, exec: &dyn Executor, report: &mut Report) -> bool {
    if probe.binary("rsyslogd") {
        report.note("found rsyslogd in PATH");
        return true;
    }
    if path_exists(std::path::Path::new(directive::DEFAULT_CONF_PATH)) {
        report.note("found /etc/rsyslog.conf");
        return true;
    }
    if exec.which("systemctl")
        && let Ok(result) = exec.run_unchecked("systemctl", &["status", "rsyslog.service"])
    {
        let out = result.combined();
        if out.contains("Loaded: loaded") || out.contains("rsyslog.service") {
            report.note("systemd reports rsyslog.service present");
            return true;
        }
    }
    false
}

fn check_running(probe: &Probe, report: &mut Report) -> bool {
    if probe.unit_active("rsyslog.service") {
        report.note("rsyslog.service is active (systemd)");
        return true;
    }
    if probe.process_running("rsyslogd") {
        report.note("rsyslogd process found via pgrep");
        return true;
    }
    false
}

fn check_apparmor_installed(probe: &Probe, report: &mut Report) -> bool {
    if probe.binary("apparmor_status") {
        report.note("found apparmor_status in PATH");
        return true;
    }
    if probe.binary("apparmor_parser") {
        report.note("found apparmor_parser in PATH");
        return true;
    }
    if path_exists(std::path::Path::new("/sys/kernel/security/apparmor/profiles"))
        || path_exists(std::path::Path::new("/sys/module/apparmor/parameters/enabled"))
    {
        report.note("AppArmor sysfs entries present");
        return true;
    }
    false
}

fn check_apparmor_enforced(probe: &Probe, report: &mut Report) -> bool {
    if let Some(pid) = probe.first_pid("rsyslogd") {
        match probe.security_label(&pid) {
            Some(label) if label != "unconfined" => {
                report.note(format!("rsyslogd confined by AppArmor label: {label}"));
                return true;
            }
            Some(_) => {
                report.note("rsyslogd is unconfined (AppArmor)");
                return false;
            }
            None => {}
        }
    }

    if let Some(out) = probe.output_of("apparmor_status", &[]) {
        if out.contains("rsyslogd (enforce)") {
            report.note("apparmor_status lists rsyslogd in enforce mode");
            return true;
        }
        if out.contains("rsyslogd (complain)") {
            // Complain mode still counts as confined, though permissive.
            report.note("apparmor_status lists rsyslogd in complain mode");
            return true;
        }
    }

    false
}
