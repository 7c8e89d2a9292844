//! Orchestrates one install or remove against one target file.
//!
//! Sequence: read, duplicate-check, mutate, atomic write preserving the
//! original file mode, service reload. The write is durable even when the
//! reload afterwards fails: configuration intent persists, operational
//! activation is a separate, retriable concern. There is no file locking;
//! concurrent invocations against the same target are unsupported and the
//! last writer wins.

use std::fs;
use std::io::Write as _;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::exec::Executor;

use super::fragment::Fragment;
use super::matcher::FragmentMatcher;
use super::mutator::{self, Removal};
use super::service::ServiceController;

/// Mode given to files the engine creates from scratch.
const NEW_FILE_MODE: u32 = 0o644;
/// Mode given to drop-in parent directories the engine creates.
const DROP_IN_DIR_MODE: u32 = 0o755;

/// Who owns the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// An externally-owned system file (e.g. an existing service
    /// configuration). It must already exist; the engine never creates it.
    External,
    /// A drop-in file owned exclusively by this tool. A missing file reads as
    /// empty, the parent directory is created on demand, and a file left
    /// empty by a removal is deleted rather than written empty.
    DropIn,
}

/// One target file plus its ownership policy.
#[derive(Debug, Clone)]
pub struct Target {
    /// Path of the file to mutate.
    pub path: PathBuf,
    /// Ownership policy applied when reading and writing.
    pub ownership: Ownership,
}

impl Target {
    /// An externally-owned target.
    #[must_use]
    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ownership: Ownership::External,
        }
    }

    /// A tool-owned drop-in target.
    #[must_use]
    pub fn drop_in(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ownership: Ownership::DropIn,
        }
    }
}

/// How to poke the configuration's consumer after a successful write.
#[derive(Debug, Clone)]
pub enum ReloadPlan {
    /// Reload/restart a service unit via the systemctl and service chains.
    Unit(String),
    /// Bring a compose deployment up from the written compose file.
    ComposeUp(PathBuf),
}

/// Applies install and remove operations to target files.
#[derive(Debug)]
pub struct Installer<'a> {
    exec: &'a dyn Executor,
}

impl<'a> Installer<'a> {
    /// Create an installer running external commands through `exec`.
    #[must_use]
    pub fn new(exec: &'a dyn Executor) -> Self {
        Self { exec }
    }

    /// Install `fragment` into the target exactly once, then reload.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyInstalled`] when the fragment is present,
    /// [`EngineError::MissingTarget`] for an absent external target,
    /// [`EngineError::Privilege`] when the path is not writable, plus I/O and
    /// reload failures. A reload failure does not roll the write back.
    pub fn install(
        &self,
        target: &Target,
        fragment: &Fragment,
        reload: Option<&ReloadPlan>,
    ) -> Result<(), EngineError> {
        let (content, mode) = self.read(target)?;
        if fragment.matcher().is_present(&content) {
            return Err(EngineError::AlreadyInstalled {
                path: target.path.clone(),
            });
        }
        check_writable(&target.path)?;

        let updated = mutator::insert(&content, fragment);
        write_atomic(&target.path, &updated, mode)?;
        tracing::debug!("wrote {} bytes to {}", updated.len(), target.path.display());

        self.reload(reload)
    }

    /// Remove the fragment identified by `matcher` from the target, then
    /// reload.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInstalled`] when the fragment is absent,
    /// [`EngineError::MarkersInconsistent`] when only the start marker is
    /// found, [`EngineError::MissingTarget`] for an absent external target,
    /// plus privilege, I/O and reload failures. As with install, a reload
    /// failure leaves the file change in place.
    pub fn remove(
        &self,
        target: &Target,
        matcher: &FragmentMatcher,
        reload: Option<&ReloadPlan>,
    ) -> Result<(), EngineError> {
        let (content, mode) = self.read_for_remove(target)?;

        let updated = match mutator::remove(&content, matcher) {
            Removal::NotFound => {
                return Err(EngineError::NotInstalled {
                    path: target.path.clone(),
                });
            }
            Removal::Inconsistent => {
                return Err(EngineError::MarkersInconsistent {
                    path: target.path.clone(),
                });
            }
            Removal::Updated(updated) => updated,
        };

        check_writable(&target.path)?;
        if updated.is_empty() && target.ownership == Ownership::DropIn {
            // The drop-in belongs to this tool; an empty one is just litter.
            fs::remove_file(&target.path).map_err(|source| io_error("remove", &target.path, source))?;
            tracing::debug!("deleted {}", target.path.display());
        } else {
            write_atomic(&target.path, &updated, mode)?;
            tracing::debug!("wrote {} bytes to {}", updated.len(), target.path.display());
        }

        self.reload(reload)
    }

    fn reload(&self, reload: Option<&ReloadPlan>) -> Result<(), EngineError> {
        let Some(plan) = reload else {
            return Ok(());
        };
        let controller = ServiceController::new(self.exec);
        match plan {
            ReloadPlan::Unit(unit) => controller.reload_unit(unit)?,
            ReloadPlan::ComposeUp(file) => controller.compose(file, &["up", "-d"])?,
        }
        Ok(())
    }

    fn read(&self, target: &Target) -> Result<(String, Option<u32>), EngineError> {
        match read_with_mode(&target.path) {
            Ok(found) => Ok(found),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                match target.ownership {
                    Ownership::External => Err(EngineError::MissingTarget {
                        path: target.path.clone(),
                    }),
                    Ownership::DropIn => {
                        create_parent(&target.path)?;
                        Ok((String::new(), None))
                    }
                }
            }
            Err(source) => Err(io_error("read", &target.path, source)),
        }
    }

    fn read_for_remove(&self, target: &Target) -> Result<(String, Option<u32>), EngineError> {
        match read_with_mode(&target.path) {
            Ok(found) => Ok(found),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                match target.ownership {
                    Ownership::External => Err(EngineError::MissingTarget {
                        path: target.path.clone(),
                    }),
                    // A missing drop-in means nothing is installed.
                    Ownership::DropIn => Err(EngineError::NotInstalled {
                        path: target.path.clone(),
                    }),
                }
            }
            Err(source) => Err(io_error("read", &target.path, source)),
        }
    }
}

fn read_with_mode(path: &Path) -> Result<(String, Option<u32>), std::io::Error> {
    let metadata = fs::metadata(path)?;
    let content = fs::read_to_string(path)?;
    Ok((content, Some(metadata.permissions().mode() & 0o7777)))
}

/// Probe write access up front so a protected path surfaces as a privilege
/// error instead of a generic I/O failure halfway through.
fn check_writable(path: &Path) -> Result<(), EngineError> {
    match fs::OpenOptions::new().append(true).open(path) {
        Ok(_) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(EngineError::Privilege {
                path: path.to_path_buf(),
            })
        }
        // Missing files and other oddities are handled by the write itself.
        Err(_) => Ok(()),
    }
}

fn create_parent(path: &Path) -> Result<(), EngineError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DROP_IN_DIR_MODE)
        .create(parent)
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::PermissionDenied => EngineError::Privilege {
                path: parent.to_path_buf(),
            },
            _ => io_error("create directory", parent, source),
        })
}

/// Write via a temp file in the target's directory plus rename, preserving
/// the original file mode (new files get 0644).
fn write_atomic(path: &Path, content: &str, mode: Option<u32>) -> Result<(), EngineError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| match source.kind() {
        std::io::ErrorKind::PermissionDenied => EngineError::Privilege {
            path: path.to_path_buf(),
        },
        _ => io_error("create temp file in", dir, source),
    })?;

    tmp.write_all(content.as_bytes())
        .map_err(|source| io_error("write", path, source))?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode.unwrap_or(NEW_FILE_MODE)))
        .map_err(|source| io_error("set mode on", path, source))?;
    tmp.as_file()
        .sync_all()
        .map_err(|source| io_error("sync", path, source))?;
    tmp.persist(path).map_err(|err| {
        if err.error.kind() == std::io::ErrorKind::PermissionDenied {
            EngineError::Privilege {
                path: path.to_path_buf(),
            }
        } else {
            io_error("rename temp file over", path, err.error)
        }
    })?;
    Ok(())
}

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn fragment() -> Fragment {
        Fragment::line("directive payload")
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // install
    // -----------------------------------------------------------------------

    #[test]
    fn install_appends_fragment_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        installer
            .install(&Target::external(&path), &fragment(), None)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "existing\ndirective payload\n"
        );
    }

    #[test]
    fn install_twice_fails_and_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        installer
            .install(&Target::external(&path), &fragment(), None)
            .unwrap();
        let after_first = fs::read_to_string(&path).unwrap();

        let err = installer
            .install(&Target::external(&path), &fragment(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyInstalled { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn install_into_missing_external_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.conf");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        let err = installer
            .install(&Target::external(&path), &fragment(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingTarget { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn install_creates_drop_in_parent_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsyslog.d").join("99-persist.conf");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        installer
            .install(&Target::drop_in(&path), &fragment(), None)
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "directive payload\n");
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn install_preserves_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        installer
            .install(&Target::external(&path), &fragment(), None)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn install_reloads_unit_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "");
        let exec = MockExecutor::ok("").with_which("systemctl");
        let installer = Installer::new(&exec);

        installer
            .install(
                &Target::external(&path),
                &fragment(),
                Some(&ReloadPlan::Unit("rsyslog".to_string())),
            )
            .unwrap();

        assert_eq!(exec.calls(), vec!["systemctl reload rsyslog"]);
    }

    #[test]
    fn install_keeps_written_file_when_reload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        // Both systemctl verbs fail; the mutation must survive anyway.
        let exec = MockExecutor::with_responses(vec![
            (false, "reload failed".to_string()),
            (false, "restart failed".to_string()),
        ])
        .with_which("systemctl");
        let installer = Installer::new(&exec);

        let err = installer
            .install(
                &Target::external(&path),
                &fragment(),
                Some(&ReloadPlan::Unit("rsyslog".to_string())),
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::Service(_)));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "existing\ndirective payload\n"
        );
    }

    // -----------------------------------------------------------------------
    // remove
    // -----------------------------------------------------------------------

    #[test]
    fn remove_restores_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);
        let f = fragment();

        installer
            .install(&Target::external(&path), &f, None)
            .unwrap();
        installer
            .remove(&Target::external(&path), f.matcher(), None)
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\n");
    }

    #[test]
    fn remove_without_install_fails_and_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "rsyslog.conf", "existing\n");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        let err = installer
            .remove(&Target::external(&path), fragment().matcher(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInstalled { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\n");
    }

    #[test]
    fn remove_from_missing_external_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.conf");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        let err = installer
            .remove(&Target::external(&path), fragment().matcher(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingTarget { .. }));
    }

    #[test]
    fn remove_reports_inconsistent_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "apache2.conf", "# BEGIN p\nbody\n");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);
        let matcher = FragmentMatcher::block("# BEGIN p", "# END p");

        let err = installer
            .remove(&Target::external(&path), &matcher, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::MarkersInconsistent { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# BEGIN p\nbody\n");
    }

    #[test]
    fn removing_last_fragment_deletes_drop_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsyslog.d").join("99-persist.conf");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);
        let f = fragment();

        installer.install(&Target::drop_in(&path), &f, None).unwrap();
        assert!(path.exists());
        installer
            .remove(&Target::drop_in(&path), f.matcher(), None)
            .unwrap();
        assert!(!path.exists(), "empty drop-in should be deleted");
    }

    #[test]
    fn remove_from_missing_drop_in_reports_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsyslog.d").join("99-persist.conf");
        let exec = MockExecutor::default();
        let installer = Installer::new(&exec);

        let err = installer
            .remove(&Target::drop_in(&path), fragment().matcher(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInstalled { .. }));
    }
}
