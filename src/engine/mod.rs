//! Idempotent configuration-mutation engine.
//!
//! The engine renders a validated text fragment, inserts it into an existing
//! system file (or a generated drop-in) exactly once, later locates and
//! removes exactly that fragment while preserving the rest of the file, and
//! drives the correct service-reload command for the host.
//!
//! Pipeline: params -> [`fragment::Fragment`] -> [`installer::Installer`]
//! (read, [`matcher::FragmentMatcher`] duplicate check, [`mutator`] edit,
//! atomic write) -> [`service::ServiceController`] reload.

pub mod fragment;
pub mod installer;
pub mod matcher;
pub mod mutator;
pub mod service;

pub use fragment::Fragment;
pub use installer::{Installer, Ownership, ReloadPlan, Target};
pub use matcher::FragmentMatcher;
pub use service::ServiceController;
