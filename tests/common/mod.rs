// Shared helpers for integration tests.
//
// Provides temporary-directory-backed target files so each integration test
// can set up an isolated environment without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Write `content` to `name` inside the temp dir and return the full path.
pub fn write_target(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write target file");
    path
}

/// Read a file back as a string.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read target file")
}
