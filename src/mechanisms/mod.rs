//! Persistence mechanisms wired to the shared engine.
//!
//! Each mechanism supplies a renderer and a target-path policy; duplicate
//! location, text mutation, atomic writes, and service reloads all come from
//! [`crate::engine`].

pub mod apache;
pub mod compose;
pub mod syslog;
