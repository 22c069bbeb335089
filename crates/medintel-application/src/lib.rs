//! Application layer for MedIntel.
//!
//! Coordinates the domain types of `medintel-core` into the consultation
//! page's behaviour: the conferencing session lifecycle, prescription history
//! synchronisation and the page controller that drives both.

pub mod consultation;
pub mod prescription_sync_service;
pub mod session;

pub use consultation::{ConsultationNotice, ConsultationPage, ConsultationView, HistoryEntry};
pub use prescription_sync_service::PrescriptionSyncService;
pub use session::{SessionLifecycleManager, SessionState};

#[cfg(test)]
mod test_support;
