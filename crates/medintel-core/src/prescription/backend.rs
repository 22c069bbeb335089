//! Prescription backend trait.
//!
//! Defines the two remote endpoints the consultation core talks to.

use async_trait::async_trait;

use super::model::{PrescriptionPayload, PrescriptionRecord};
use crate::error::Result;

/// Remote persistence for prescriptions.
///
/// Implementations map non-success responses to `MedintelError::Http` and
/// connection problems to `MedintelError::Transport`; callers decide whether a
/// failure is surfaced or only logged.
#[async_trait]
pub trait PrescriptionBackend: Send + Sync {
    /// Fetches the saved prescriptions for a patient.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Non-empty patient id
    ///
    /// # Returns
    ///
    /// The records in the order the backend returned them.
    async fn fetch_history(&self, patient_id: &str) -> Result<Vec<PrescriptionRecord>>;

    /// Persists a prescription.
    ///
    /// # Returns
    ///
    /// The raw response body. It is not load-bearing and is only logged.
    async fn save_prescription(&self, payload: &PrescriptionPayload) -> Result<serde_json::Value>;
}
