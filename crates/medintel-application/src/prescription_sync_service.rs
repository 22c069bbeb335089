//! Prescription history synchronisation.
//!
//! History policy: the first successful fetch for a patient becomes the base
//! snapshot, and records saved locally are prepended on top of it. History is
//! never re-fetched after a save, and a late fetch never drops a local record.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use medintel_core::Identity;
use medintel_core::error::{MedintelError, Result};
use medintel_core::prescription::{
    LineItem, PrescriptionBackend, PrescriptionPayload, PrescriptionRecord,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct HistoryState {
    /// Patient the history belongs to.
    patient_id: String,
    /// Bumped on every patient switch; responses carry the value they started with.
    generation: u64,
    snapshot_loaded: bool,
    /// Records saved in this session, newest first.
    local: Vec<PrescriptionRecord>,
    /// Records from the fetch endpoint, in the order it returned them.
    base: Vec<PrescriptionRecord>,
}

impl HistoryState {
    /// Points the history at `patient_id`, dropping another patient's records.
    fn select_patient(&mut self, patient_id: &str) {
        if self.patient_id == patient_id {
            return;
        }
        self.patient_id = patient_id.to_string();
        self.generation += 1;
        self.snapshot_loaded = false;
        self.local.clear();
        self.base.clear();
    }

    fn records(&self) -> Vec<PrescriptionRecord> {
        self.local.iter().chain(self.base.iter()).cloned().collect()
    }
}

/// Releases an in-flight save slot when the save finishes, however it exits.
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<(String, String)>>,
    key: (String, String),
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slots: &'a Mutex<HashSet<(String, String)>>, identity: &Identity) -> Option<Self> {
        let key = (identity.doctor_id.clone(), identity.patient_id.clone());
        let mut held = slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(key.clone()) {
            return None;
        }
        Some(Self { slots, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}

/// Keeps the patient's prescription history in step with the backend.
///
/// This service is the only writer of the history list.
pub struct PrescriptionSyncService {
    backend: Arc<dyn PrescriptionBackend>,
    history: RwLock<HistoryState>,
    saves_in_flight: Mutex<HashSet<(String, String)>>,
}

impl PrescriptionSyncService {
    pub fn new(backend: Arc<dyn PrescriptionBackend>) -> Self {
        Self {
            backend,
            history: RwLock::new(HistoryState::default()),
            saves_in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Current history, newest local saves first.
    pub async fn history(&self) -> Vec<PrescriptionRecord> {
        self.history.read().await.records()
    }

    /// Patient the history currently belongs to (empty before any load/save).
    pub async fn current_patient(&self) -> String {
        self.history.read().await.patient_id.clone()
    }

    /// Loads the history snapshot for `patient_id`.
    ///
    /// Best effort: failures are logged and leave history unchanged. Skipped
    /// without a request when `patient_id` is empty or the snapshot for this
    /// patient is already loaded. A response that arrives after the patient
    /// changed is discarded.
    ///
    /// # Returns
    ///
    /// The history after the call.
    pub async fn load_history(&self, patient_id: &str) -> Vec<PrescriptionRecord> {
        if patient_id.is_empty() {
            tracing::debug!("[PrescriptionSync] No patient id; history fetch skipped");
            return self.history().await;
        }

        let generation = {
            let mut state = self.history.write().await;
            state.select_patient(patient_id);
            if state.snapshot_loaded {
                tracing::debug!(
                    "[PrescriptionSync] Snapshot for patient {} already loaded",
                    patient_id
                );
                return state.records();
            }
            state.generation
        };

        let fetched = self.backend.fetch_history(patient_id).await;

        let mut state = self.history.write().await;
        match fetched {
            Ok(records) => {
                if state.generation != generation {
                    tracing::debug!(
                        "[PrescriptionSync] Discarding stale history for patient {} (now {})",
                        patient_id,
                        state.patient_id
                    );
                } else if state.snapshot_loaded {
                    tracing::debug!(
                        "[PrescriptionSync] Snapshot for patient {} arrived twice; keeping the first",
                        patient_id
                    );
                } else {
                    tracing::info!(
                        "[PrescriptionSync] Loaded {} past prescriptions for patient {}",
                        records.len(),
                        patient_id
                    );
                    state.base = records;
                    state.snapshot_loaded = true;
                }
            }
            Err(e) => {
                tracing::warn!(
                    "[PrescriptionSync] Failed to fetch past prescriptions for patient {}: {}",
                    patient_id,
                    e
                );
            }
        }
        state.records()
    }

    /// Persists a prescription and prepends its display copy to history.
    ///
    /// The record shown in history is built locally from the payload and the
    /// current time; the response body is only logged.
    ///
    /// # Errors
    ///
    /// - `SaveInFlight` if a save for the same doctor and patient is running;
    ///   no request is sent
    /// - `Http` / `Transport` from the backend; history is unchanged
    pub async fn save(
        &self,
        identity: &Identity,
        prescriptions: Vec<LineItem>,
    ) -> Result<PrescriptionRecord> {
        let Some(_guard) = InFlightGuard::acquire(&self.saves_in_flight, identity) else {
            tracing::warn!(
                "[PrescriptionSync] Save already in progress for patient {}; ignoring",
                identity.patient_id
            );
            return Err(MedintelError::SaveInFlight {
                patient_id: identity.patient_id.clone(),
            });
        };

        let started_on = self.history.read().await.patient_id.clone();

        let payload = PrescriptionPayload {
            doctor_id: identity.doctor_id.clone(),
            patient_id: identity.patient_id.clone(),
            prescriptions,
        };

        let response = self
            .backend
            .save_prescription(&payload)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "[PrescriptionSync] Error saving prescription for patient {}: {}",
                    payload.patient_id,
                    e
                )
            })?;
        tracing::debug!("[PrescriptionSync] Save response: {}", response);

        let record = PrescriptionRecord::from_payload(payload, Utc::now());

        // Shown if history belongs to the record's patient, or still belongs to
        // whoever it showed when the save started.
        let mut state = self.history.write().await;
        if state.patient_id == record.patient_id || state.patient_id == started_on {
            state.select_patient(&record.patient_id);
            state.local.insert(0, record.clone());
        } else {
            tracing::info!(
                "[PrescriptionSync] History moved to patient {} during save; record for {} not shown",
                state.patient_id,
                record.patient_id
            );
        }

        tracing::info!(
            "[PrescriptionSync] Saved prescription with {} line items for patient {}",
            record.prescriptions.len(),
            record.patient_id
        );
        Ok(record)
    }
}
