//! Conferencing session services.
//!
//! The lifecycle manager owns the embedded widget handle and guarantees that
//! at most one handle is alive per container.

mod lifecycle;

pub use lifecycle::{SessionLifecycleManager, SessionState};
