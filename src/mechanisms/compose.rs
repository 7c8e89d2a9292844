//! Container-autostart persistence: a generated docker compose deployment.
//!
//! The rendered compose document launches a privileged container with the
//! host root mounted at `/mnt`, executes the payload via `chroot /mnt`, and
//! relies on `restart: "always"` plus the docker daemon to bring it back on
//! boot. The document lives in a dedicated output directory owned by this
//! tool.

use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Probe, Report};
use crate::engine::{Fragment, Installer, ReloadPlan, ServiceController, Target};
use crate::error::EngineError;
use crate::error::ValidationError;
use crate::exec::Executor;

/// File name written inside the output directory.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Default directory the compose file is written to.
pub const DEFAULT_OUTPUT_DIR: &str = "/opt/persist-compose";

/// First line of every generated compose document; its presence identifies a
/// file as ours.
pub const HEADER: &str = "# persist-generated docker-compose configuration";

/// Report label for the aggregate docker-access check.
pub const ACCESS_LABEL: &str = "user has docker access";

/// Parameters for rendering the compose document.
#[derive(Debug, Clone)]
pub struct ComposeParams {
    /// Name used for both the compose service and the container.
    pub service_name: String,
    /// Container image to launch.
    pub image: String,
    /// Command executed on the host after mounting `/` via chroot.
    pub payload_command: String,
}

impl ComposeParams {
    /// Ensure the required parameters are present and safe for rendering.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for empty fields, an invalid service
    /// name, or embedded newlines.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_name.trim().is_empty() {
            return Err(ValidationError::Required { field: "service name" });
        }
        if !is_valid_service_name(&self.service_name) {
            return Err(ValidationError::InvalidServiceName {
                name: self.service_name.clone(),
            });
        }
        if self.image.trim().is_empty() {
            return Err(ValidationError::Required { field: "image" });
        }
        if self.payload_command.trim().is_empty() {
            return Err(ValidationError::Required { field: "payload" });
        }
        for (field, value) in [
            ("image", &self.image),
            ("payload", &self.payload_command),
        ] {
            if value.contains('\n') {
                return Err(ValidationError::EmbeddedNewline { field });
            }
        }
        Ok(())
    }
}

fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Render the compose document.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the parameters are invalid; no I/O is
/// performed.
pub fn render(params: &ComposeParams) -> Result<Fragment, ValidationError> {
    params.validate()?;

    let mut doc = String::new();
    doc.push_str(HEADER);
    doc.push('\n');
    doc.push_str("version: \"3.9\"\n");
    doc.push_str("services:\n");
    doc.push_str(&format!("  {}:\n", params.service_name));
    doc.push_str(&format!("    container_name: {}\n", params.service_name));
    doc.push_str(&format!("    image: {}\n", params.image));
    doc.push_str("    privileged: true\n");
    doc.push_str("    pid: \"host\"\n");
    doc.push_str("    network_mode: \"host\"\n");
    doc.push_str("    volumes:\n");
    doc.push_str("      - \"/:/mnt\"\n");
    doc.push_str("    command:\n");
    doc.push_str("      - /bin/sh\n");
    doc.push_str("      - -c\n");
    doc.push_str(&format!("      - chroot /mnt {}\n", params.payload_command));
    doc.push_str("    restart: \"always\"\n");

    Ok(Fragment::document(doc, HEADER))
}

/// Write the compose file into `output_dir` and, when `start` is set, bring
/// the deployment up with the compose command chain. Returns the written
/// path.
///
/// # Errors
///
/// Propagates validation, idempotency, privilege, I/O and compose errors
/// from the engine. The written file stays in place when the compose
/// invocation fails.
pub fn install(
    exec: &dyn Executor,
    params: &ComposeParams,
    output_dir: &Path,
    start: bool,
) -> Result<PathBuf, EngineError> {
    let fragment = render(params)?;
    let path = output_dir.join(COMPOSE_FILE_NAME);
    let plan = start.then(|| ReloadPlan::ComposeUp(path.clone()));
    Installer::new(exec).install(&Target::drop_in(&path), &fragment, plan.as_ref())?;
    Ok(path)
}

/// Stop the deployment and delete the compose file.
///
/// `docker compose down` runs before the file is deleted because the file is
/// the input to the down command; the now-empty output directory is removed
/// best-effort afterwards.
///
/// # Errors
///
/// Propagates idempotency, compose and I/O errors.
pub fn remove(exec: &dyn Executor, output_dir: &Path, stop: bool) -> Result<(), EngineError> {
    let path = output_dir.join(COMPOSE_FILE_NAME);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::NotInstalled { path });
        }
        Err(source) => {
            return Err(EngineError::Io {
                op: "read",
                path,
                source,
            });
        }
    };
    let ours = crate::engine::FragmentMatcher::line(HEADER.to_string());
    if !ours.is_present(&content) {
        return Err(EngineError::NotInstalled { path });
    }

    if stop {
        ServiceController::new(exec).compose(&path, &["down"])?;
    }

    fs::remove_file(&path).map_err(|source| EngineError::Io {
        op: "remove",
        path: path.clone(),
        source,
    })?;
    tracing::debug!("deleted {}", path.display());

    // Directory cleanup is best-effort; shared or protected directories stay.
    if let Err(err) = fs::remove_dir(output_dir)
        && !matches!(
            err.kind(),
            std::io::ErrorKind::NotFound
                | std::io::ErrorKind::PermissionDenied
                | std::io::ErrorKind::DirectoryNotEmpty
        )
    {
        return Err(EngineError::Io {
            op: "clean up",
            path: output_dir.to_path_buf(),
            source: err,
        });
    }

    Ok(())
}

/// Probe the local docker installation: binary and compose availability,
/// whether the user can reach the daemon, and what is already present.
#[must_use]
pub fn check(exec: &dyn Executor) -> Report {
    let probe = Probe::new(exec);
    let mut report = Report::new();

    let docker = probe.binary("docker");
    let compose = compose_available(exec);
    let root = probe.effective_root();
    if root {
        report.note("running as root");
    }

    let mut in_docker_group = false;
    if !root {
        in_docker_group = probe.in_group("docker");
        if in_docker_group {
            report.note("current user is a member of the docker group");
        }
    }

    let mut docker_ps = false;
    if docker {
        match exec.run_unchecked("docker", &["ps"]) {
            Ok(result) if result.success => {
                docker_ps = true;
                if !result.stdout.trim().is_empty() {
                    report.note("docker ps returned data");
                }
            }
            _ => {
                report.note("docker ps failed (user may lack permissions or daemon stopped)");
            }
        }

        if let Some(images) = probe.lines_of(
            "docker",
            &["image", "ls", "--format", "{{.Repository}}:{{.Tag}} ({{.ID}})"],
        ) {
            report.section("Images", images);
        }
        if let Some(containers) = probe.lines_of(
            "docker",
            &["ps", "-a", "--format", "{{.Names}} ({{.Image}}) status {{.Status}}"],
        ) {
            report.section("Containers", containers);
        }
    }

    report.check("docker binary present", docker);
    report.check("docker compose available", compose);
    report.check(ACCESS_LABEL, root || in_docker_group || docker_ps);

    report
}

fn compose_available(exec: &dyn Executor) -> bool {
    if exec.which("docker")
        && exec
            .run_unchecked("docker", &["compose", "version"])
            .is_ok_and(|result| result.success)
    {
        return true;
    }
    exec.which("docker-compose")
}
