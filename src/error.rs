//! Domain-specific error types for the persistence engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors ([`ValidationError`], [`EngineError`],
//! [`ServiceError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! EngineError
//! ├── Validation(ValidationError) — malformed parameters, raised before any I/O
//! ├── Privilege                   — caller may not write the target path
//! ├── AlreadyInstalled            — install when the fragment is present
//! ├── NotInstalled                — remove when the fragment is absent
//! ├── MarkersInconsistent         — start marker found without its end marker
//! ├── MissingTarget               — externally-owned config file does not exist
//! ├── Io                          — read/write/stat failure, wrapped with the path
//! └── Service(ServiceError)       — every reload fallback failed
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating mechanism parameters, always before any
/// filesystem or process side effect.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field was empty or missing.
    #[error("{field} is required")]
    Required {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field contained an embedded newline, which would break out of the
    /// generated fragment's syntax.
    #[error("{field} must not contain newlines")]
    EmbeddedNewline {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field that must be an absolute path was relative.
    #[error("{field} must be an absolute path")]
    RelativePath {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field contained characters that are unsafe for the target syntax.
    #[error("{field} must not contain quotes or angle brackets")]
    UnsafeCharacters {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A compose service name contained characters outside `[A-Za-z0-9_-]`.
    #[error("service name {name:?} must contain only letters, numbers, dashes, or underscores")]
    InvalidServiceName {
        /// The rejected service name.
        name: String,
    },

    /// The ruleset wrapper was requested without a name for it.
    #[error("a ruleset name is required when the ruleset wrapper is enabled")]
    MissingRulesetName,

    /// No trigger predicate was supplied at all.
    #[error("at least one message filter (substring or regex) is required")]
    NoFilter,
}

/// Errors raised by the configuration-mutation engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Parameter validation failed before any I/O was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller lacks the rights to mutate the target path.
    #[error("insufficient privileges to modify {} (run with sudo)", path.display())]
    Privilege {
        /// Path the caller could not write.
        path: PathBuf,
    },

    /// Install was requested but the fragment is already present.
    #[error("snippet already present in {}", path.display())]
    AlreadyInstalled {
        /// Target file that already contains the fragment.
        path: PathBuf,
    },

    /// Remove was requested but the fragment is not present.
    #[error("snippet not found in {}", path.display())]
    NotInstalled {
        /// Target file that does not contain the fragment.
        path: PathBuf,
    },

    /// A start marker was found without its matching end marker.
    #[error("end marker missing in {}; refusing to touch an inconsistent block", path.display())]
    MarkersInconsistent {
        /// Target file with the damaged marker pair.
        path: PathBuf,
    },

    /// An externally-owned configuration file is absent.
    #[error("configuration file {} does not exist", path.display())]
    MissingTarget {
        /// The missing file.
        path: PathBuf,
    },

    /// A filesystem operation failed.
    #[error("{op} {}: {source}", path.display())]
    Io {
        /// Short verb describing the operation ("read", "write", ...).
        op: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Every service-reload fallback failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Errors raised by the service-reload fallback chains.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Neither systemctl nor the SysV service wrapper is on PATH.
    #[error("could not find a way to reload {subject} (systemctl and service unavailable)")]
    NoReloadTool {
        /// Unit that could not be reloaded.
        subject: String,
    },

    /// Neither `docker compose` nor `docker-compose` is usable.
    #[error("docker compose command not found (tried 'docker compose' and 'docker-compose')")]
    NoComposeTool,

    /// Every reload and restart attempt failed; `detail` aggregates the
    /// per-attempt failure messages.
    #[error("failed to reload {subject}: {detail}")]
    ReloadFailed {
        /// Unit that could not be reloaded.
        subject: String,
        /// Combined failure output of every attempted tool.
        detail: String,
    },

    /// Every compose invocation failed; `detail` aggregates the per-attempt
    /// failure messages.
    #[error("docker compose {action} failed: {detail}")]
    ComposeFailed {
        /// The compose verb that was attempted ("up", "down").
        action: String,
        /// Combined failure output of every attempted command.
        detail: String,
    },
}
