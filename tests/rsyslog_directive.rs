#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration tests for the rsyslog trigger-directive mechanism.
//!
//! All scenarios run against temp files with the service reload skipped, so
//! nothing on the host is touched.

mod common;

use common::{read, write_target};
use persist_cli::error::EngineError;
use persist_cli::exec::SystemExecutor;
use persist_cli::mechanisms::syslog::directive::{DirectiveParams, install, remove, render};

fn params(trigger: &str, payload: &str) -> DirectiveParams {
    DirectiveParams {
        trigger: trigger.to_string(),
        payload: payload.to_string(),
    }
}

#[test]
fn render_produces_exact_directive_line() {
    let fragment = render(&params("hacker", "/path/to/payload")).unwrap();
    assert_eq!(
        fragment.text(),
        ":msg, contains, \"hacker\" ^/path/to/payload\n"
    );
}

#[test]
fn install_appends_and_remove_restores() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_target(&dir, "rsyslog.conf", "module(load=\"imuxsock\")\n");
    let exec = SystemExecutor;
    let p = params("hacker", "/path/to/payload");

    install(&exec, &p, &conf, false).unwrap();
    assert_eq!(
        read(&conf),
        "module(load=\"imuxsock\")\n:msg, contains, \"hacker\" ^/path/to/payload\n"
    );

    remove(&exec, &p, &conf, false).unwrap();
    assert_eq!(read(&conf), "module(load=\"imuxsock\")\n");
}

#[test]
fn second_install_fails_and_leaves_file_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_target(&dir, "rsyslog.conf", "existing\n");
    let exec = SystemExecutor;
    let p = params("hacker", "/path/to/payload");

    install(&exec, &p, &conf, false).unwrap();
    let snapshot = read(&conf);

    let err = install(&exec, &p, &conf, false).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyInstalled { .. }));
    assert_eq!(read(&conf), snapshot);
}

#[test]
fn directive_with_different_payload_is_a_different_installation() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_target(&dir, "rsyslog.conf", "");
    let exec = SystemExecutor;

    install(&exec, &params("hacker", "/bin/first"), &conf, false).unwrap();
    // Same trigger, different payload: not a duplicate.
    install(&exec, &params("hacker", "/bin/second"), &conf, false).unwrap();

    let content = read(&conf);
    assert!(content.contains("^/bin/first"));
    assert!(content.contains("^/bin/second"));
}

#[test]
fn remove_without_install_fails_and_leaves_file_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_target(&dir, "rsyslog.conf", "untouched\n");
    let exec = SystemExecutor;

    let err = remove(&exec, &params("hacker", "/bin/x"), &conf, false).unwrap_err();
    assert!(matches!(err, EngineError::NotInstalled { .. }));
    assert_eq!(read(&conf), "untouched\n");
}

#[test]
fn install_into_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("rsyslog.conf");
    let exec = SystemExecutor;

    let err = install(&exec, &params("hacker", "/bin/x"), &conf, false).unwrap_err();
    assert!(matches!(err, EngineError::MissingTarget { .. }));
    assert!(!conf.exists(), "missing external config must not be created");
}
