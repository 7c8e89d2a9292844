//! Read-only feasibility probing and reporting.
//!
//! Nothing in this module mutates system state. Probes shell out through the
//! injected [`Executor`] (PATH lookups, `systemctl is-active`, `pgrep`) or
//! inspect the process's own credentials; each mechanism assembles the probe
//! results into a [`Report`] the CLI prints before offering install/remove.

use std::path::Path;

use serde::Serialize;

use crate::exec::Executor;

/// One pass/fail line of a report.
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    /// Human-readable label.
    pub label: String,
    /// Whether the check passed.
    pub pass: bool,
}

/// A titled list rendered after the checks (docker images, containers, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    /// Section heading.
    pub title: String,
    /// One line per item.
    pub items: Vec<String>,
}

/// Structured result of a feasibility check.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Ordered pass/fail checks.
    pub checks: Vec<CheckItem>,
    /// Extra listings (may be empty).
    pub sections: Vec<Section>,
    /// Free-text observations gathered while probing.
    pub notes: Vec<String>,
}

impl Report {
    /// An empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass/fail check.
    pub fn check(&mut self, label: impl Into<String>, pass: bool) {
        self.checks.push(CheckItem {
            label: label.into(),
            pass,
        });
    }

    /// Record a free-text note.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Add a titled listing; empty listings are dropped.
    pub fn section(&mut self, title: impl Into<String>, items: Vec<String>) {
        if !items.is_empty() {
            self.sections.push(Section {
                title: title.into(),
                items,
            });
        }
    }

    /// Whether the check with this label passed (false when absent).
    #[must_use]
    pub fn passed(&self, label: &str) -> bool {
        self.checks
            .iter()
            .any(|check| check.label == label && check.pass)
    }

    /// Human-readable rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let status = if check.pass { "YES" } else { "NO" };
            out.push_str(&format!("- {}: {}\n", check.label, status));
        }
        for section in &self.sections {
            out.push('\n');
            out.push_str(&section.title);
            out.push_str(":\n");
            for item in &section.items {
                out.push_str(&format!("- {item}\n"));
            }
        }
        if !self.notes.is_empty() {
            out.push_str("\nNotes:\n");
            for note in &self.notes {
                out.push_str(&format!("- {note}\n"));
            }
        }
        out
    }

    /// JSON rendering of the same structure.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Shared probing helpers over an [`Executor`].
#[derive(Debug)]
pub struct Probe<'a> {
    exec: &'a dyn Executor,
}

impl<'a> Probe<'a> {
    /// Create a probe running commands through `exec`.
    #[must_use]
    pub fn new(exec: &'a dyn Executor) -> Self {
        Self { exec }
    }

    /// Whether a binary is on PATH.
    #[must_use]
    pub fn binary(&self, name: &str) -> bool {
        self.exec.which(name)
    }

    /// Whether systemd reports the unit as active. False when systemctl is
    /// absent.
    #[must_use]
    pub fn unit_active(&self, unit: &str) -> bool {
        if !self.exec.which("systemctl") {
            return false;
        }
        self.exec
            .run_unchecked("systemctl", &["is-active", unit])
            .is_ok_and(|result| result.success && result.stdout.trim() == "active")
    }

    /// Whether a process with exactly this name is running (via `pgrep -x`).
    #[must_use]
    pub fn process_running(&self, name: &str) -> bool {
        self.first_pid(name).is_some()
    }

    /// First PID of a process with exactly this name, if any.
    #[must_use]
    pub fn first_pid(&self, name: &str) -> Option<String> {
        if !self.exec.which("pgrep") {
            return None;
        }
        let result = self.exec.run_unchecked("pgrep", &["-x", name]).ok()?;
        if !result.success {
            return None;
        }
        result
            .stdout
            .split_whitespace()
            .next()
            .map(ToString::to_string)
    }

    /// Whether the effective UID is root.
    #[must_use]
    pub fn effective_root(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }

    /// Whether the current user is a member of the named group.
    #[must_use]
    pub fn in_group(&self, name: &str) -> bool {
        let Ok(groups) = nix::unistd::getgroups() else {
            return false;
        };
        groups.iter().any(|gid| {
            nix::unistd::Group::from_gid(*gid)
                .ok()
                .flatten()
                .is_some_and(|group| group.name == name)
        })
    }

    /// The process's security label from `/proc/PID/attr/current`, if
    /// readable and non-empty.
    #[must_use]
    pub fn security_label(&self, pid: &str) -> Option<String> {
        let path = format!("/proc/{pid}/attr/current");
        let label = std::fs::read_to_string(path).ok()?;
        let label = label.trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }

    /// Run a command and return its trimmed combined output regardless of
    /// exit status, or `None` if it could not be spawned.
    #[must_use]
    pub fn output_of(&self, program: &str, args: &[&str]) -> Option<String> {
        if !self.exec.which(program) {
            return None;
        }
        self.exec
            .run_unchecked(program, args)
            .ok()
            .map(|result| result.combined())
    }

    /// The non-empty lines of a command's stdout when it succeeds.
    #[must_use]
    pub fn lines_of(&self, program: &str, args: &[&str]) -> Option<Vec<String>> {
        let result = self.exec.run_unchecked(program, args).ok()?;
        if !result.success {
            return None;
        }
        Some(
            result
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }
}

/// Whether a path exists.
#[must_use]
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Whether the file can be opened for appending by the current user.
#[must_use]
pub fn file_writable(path: &Path) -> bool {
    std::fs::OpenOptions::new().append(true).open(path).is_ok()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    // -----------------------------------------------------------------------
    // Report rendering
    // -----------------------------------------------------------------------

    #[test]
    fn render_formats_checks_as_yes_no_lines() {
        let mut report = Report::new();
        report.check("rsyslog installed", true);
        report.check("rsyslog running", false);
        assert_eq!(
            report.render(),
            "- rsyslog installed: YES\n- rsyslog running: NO\n"
        );
    }

    #[test]
    fn render_appends_notes_block() {
        let mut report = Report::new();
        report.check("docker binary present", true);
        report.note("running as root");
        assert_eq!(
            report.render(),
            "- docker binary present: YES\n\nNotes:\n- running as root\n"
        );
    }

    #[test]
    fn render_includes_sections_before_notes() {
        let mut report = Report::new();
        report.check("docker binary present", true);
        report.section("Images", vec!["alpine:latest (abc)".to_string()]);
        report.note("running as root");
        let rendered = report.render();
        assert!(rendered.contains("\nImages:\n- alpine:latest (abc)\n"));
        let images_at = rendered.find("Images:").unwrap();
        let notes_at = rendered.find("Notes:").unwrap();
        assert!(images_at < notes_at);
    }

    #[test]
    fn empty_sections_are_dropped() {
        let mut report = Report::new();
        report.section("Images", Vec::new());
        assert!(report.sections.is_empty());
    }

    #[test]
    fn passed_looks_up_checks_by_label() {
        let mut report = Report::new();
        report.check("a", true);
        report.check("b", false);
        assert!(report.passed("a"));
        assert!(!report.passed("b"));
        assert!(!report.passed("missing"));
    }

    #[test]
    fn to_json_includes_checks_and_notes() {
        let mut report = Report::new();
        report.check("a", true);
        report.note("n");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"label\": \"a\""));
        assert!(json.contains("\"pass\": true"));
        assert!(json.contains("\"n\""));
    }

    // -----------------------------------------------------------------------
    // Probes
    // -----------------------------------------------------------------------

    #[test]
    fn unit_active_requires_systemctl_on_path() {
        let exec = MockExecutor::ok("active\n");
        let probe = Probe::new(&exec);
        assert!(!probe.unit_active("rsyslog.service"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn unit_active_parses_is_active_output() {
        let exec = MockExecutor::ok("active\n").with_which("systemctl");
        let probe = Probe::new(&exec);
        assert!(probe.unit_active("rsyslog.service"));
        assert_eq!(exec.calls(), vec!["systemctl is-active rsyslog.service"]);
    }

    #[test]
    fn unit_active_is_false_for_inactive() {
        let exec = MockExecutor::with_responses(vec![(true, "inactive\n".to_string())])
            .with_which("systemctl");
        let probe = Probe::new(&exec);
        assert!(!probe.unit_active("rsyslog.service"));
    }

    #[test]
    fn first_pid_takes_first_field() {
        let exec = MockExecutor::ok("123\n456\n").with_which("pgrep");
        let probe = Probe::new(&exec);
        assert_eq!(probe.first_pid("rsyslogd"), Some("123".to_string()));
    }

    #[test]
    fn first_pid_none_when_pgrep_misses() {
        let exec = MockExecutor::fail().with_which("pgrep");
        let probe = Probe::new(&exec);
        assert_eq!(probe.first_pid("rsyslogd"), None);
    }

    #[test]
    fn lines_of_filters_empty_lines() {
        let exec = MockExecutor::ok("one\n\n  two  \n");
        let probe = Probe::new(&exec);
        assert_eq!(
            probe.lines_of("docker", &["image", "ls"]),
            Some(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn file_writable_for_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "x").unwrap();
        assert!(file_writable(&path));
        assert!(!file_writable(&dir.path().join("missing")));
    }
}
