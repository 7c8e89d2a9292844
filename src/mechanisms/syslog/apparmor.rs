//! Toggling the rsyslogd AppArmor profile.
//!
//! With the stock Ubuntu/Debian profile enforced, rsyslogd may be denied
//! exec, so the trigger silently never fires. The toggle is an explicit
//! opt-in: disable before install, re-enable after remove. A failed toggle
//! aborts the surrounding operation before any file is mutated.

use anyhow::{Context, Result, bail};

use crate::exec::Executor;

/// The rsyslogd profile shipped by Ubuntu/Debian.
pub const PROFILE_PATH: &str = "/etc/apparmor.d/usr.sbin.rsyslogd";
/// Directory whose symlinks mark profiles as disabled across reloads.
pub const DISABLE_DIR: &str = "/etc/apparmor.d/disable/";

const DISABLE_LINK: &str = "/etc/apparmor.d/disable/usr.sbin.rsyslogd";

/// The rsyslogd AppArmor profile, toggled through an [`Executor`].
#[derive(Debug)]
pub struct AppArmorProfile<'a> {
    exec: &'a dyn Executor,
}

impl<'a> AppArmorProfile<'a> {
    /// Create a toggle running commands through `exec`.
    #[must_use]
    pub fn new(exec: &'a dyn Executor) -> Self {
        Self { exec }
    }

    /// Unload the profile and mark it disabled so it stays off until
    /// [`enable`](Self::enable) or a reboot with the symlink removed.
    ///
    /// # Errors
    ///
    /// Returns an error when `apparmor_parser` is missing or either step
    /// fails. Requires root.
    pub fn disable(&self) -> Result<()> {
        if !self.exec.which("apparmor_parser") {
            bail!("apparmor_parser not found; is AppArmor installed?");
        }
        self.exec
            .run("apparmor_parser", &["-R", PROFILE_PATH])
            .context("failed to remove rsyslogd AppArmor profile")?;
        self.exec
            .run("ln", &["-sf", PROFILE_PATH, DISABLE_DIR])
            .context("failed to place profile in disable/")?;
        Ok(())
    }

    /// Remove the disable symlink and re-load the profile.
    ///
    /// # Errors
    ///
    /// Returns an error when `apparmor_parser` is missing or a step fails.
    /// Requires root.
    pub fn enable(&self) -> Result<()> {
        if !self.exec.which("apparmor_parser") {
            bail!("apparmor_parser not found; is AppArmor installed?");
        }
        if let Err(err) = std::fs::remove_file(DISABLE_LINK)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            return Err(err).context("failed to remove disable symlink");
        }
        self.exec
            .run("apparmor_parser", &["-r", PROFILE_PATH])
            .context("failed to re-load rsyslogd AppArmor profile")?;
        Ok(())
    }
}
