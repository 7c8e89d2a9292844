//! Host-persistence configuration engine.
//!
//! Renders configuration fragments for several independent persistence
//! techniques (log-triggered execution via rsyslog and Apache, container
//! autostart via docker compose), writes them into live system configuration
//! exactly once, removes them cleanly later, and reloads the owning service.
//!
//! The public API is organised into four layers:
//!
//! - **[`engine`]** — fragment rendering primitives, duplicate location,
//!   text mutation, atomic installation, and service-reload fallback chains
//! - **[`mechanisms`]** — one module per persistence technique wiring its
//!   renderer and target-path policy to the shared engine
//! - **[`diagnostics`]** — read-only feasibility probing and reporting
//! - **[`commands`]** — top-level subcommand orchestration

pub mod cli;
pub mod commands;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mechanisms;
