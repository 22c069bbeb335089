//! Consultation page controller.
//!
//! Wires the identity resolver, session lifecycle manager, draft and
//! prescription sync service together and drives them from page triggers:
//! navigation, draft edits, save and unmount.

use std::sync::Arc;

use medintel_core::conference::{ConferenceHost, ConferenceProfile, WidgetContainer};
use medintel_core::config::MedintelConfig;
use medintel_core::error::{MedintelError, Result};
use medintel_core::prescription::{
    LineItemField, PrescriptionBackend, PrescriptionDraft, PrescriptionRecord,
};
use medintel_core::{Identity, IdentityResolver};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, RwLock};

use crate::prescription_sync_service::PrescriptionSyncService;
use crate::session::{SessionLifecycleManager, SessionState};

/// User-facing notices raised by the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsultationNotice {
    /// "Prescription saved successfully!"
    SaveSucceeded { record: PrescriptionRecord },
    /// "Failed to save prescription." The draft is kept for a retry.
    SaveFailed { message: String },
    /// The conferencing widget could not be embedded for `room`.
    WidgetUnavailable { room: String },
}

/// One numbered entry of the past-prescriptions list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// 1-based position in display order.
    pub number: usize,
    pub record: PrescriptionRecord,
}

/// Snapshot of everything the page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultationView {
    pub identity: Option<Identity>,
    pub session: SessionState,
    /// The draft editor is only offered when a doctor is identified.
    pub can_prescribe: bool,
    pub draft: PrescriptionDraft,
    pub history: Vec<HistoryEntry>,
    /// True when the "No past prescriptions found." placeholder is shown.
    pub history_is_empty: bool,
}

/// Drives one consultation page.
pub struct ConsultationPage {
    resolver: IdentityResolver,
    identity: RwLock<Option<Identity>>,
    lifecycle: Mutex<SessionLifecycleManager>,
    draft: Mutex<PrescriptionDraft>,
    sync: Arc<PrescriptionSyncService>,
    notices: UnboundedSender<ConsultationNotice>,
}

impl ConsultationPage {
    /// Creates the page controller.
    ///
    /// # Arguments
    ///
    /// * `config` - Identity keys and widget deployment variant
    /// * `host` - Supplies the conferencing widget constructor, if loaded
    /// * `container` - Element the widget renders into
    /// * `backend` - Prescription endpoints
    /// * `notices` - Receives save confirmations and failures
    pub fn new(
        config: &MedintelConfig,
        host: Arc<dyn ConferenceHost>,
        container: Arc<dyn WidgetContainer>,
        backend: Arc<dyn PrescriptionBackend>,
        notices: UnboundedSender<ConsultationNotice>,
    ) -> Self {
        let profile = ConferenceProfile::new(&config.conference);
        Self {
            resolver: IdentityResolver::new(&config.identity),
            identity: RwLock::new(None),
            lifecycle: Mutex::new(SessionLifecycleManager::new(host, container, profile)),
            draft: Mutex::new(PrescriptionDraft::new()),
            sync: Arc::new(PrescriptionSyncService::new(backend)),
            notices,
        }
    }

    /// Handles a mount or an address change.
    ///
    /// Re-resolves identity from `fragment`, restarts the conferencing session
    /// if the room changed, and loads history when a new patient appears.
    pub async fn navigate(&self, fragment: &str) -> Identity {
        let identity = self.resolver.resolve(fragment);
        let previous = self.identity.write().await.replace(identity.clone());

        let room_changed =
            previous.as_ref().map(|p| p.room.as_str()) != Some(identity.room.as_str());
        let session_idle = !self.lifecycle.lock().await.is_active();
        if room_changed || session_idle {
            self.start_session(&identity.room).await;
        }

        let patient_changed =
            previous.as_ref().map(|p| p.patient_id.as_str()) != Some(identity.patient_id.as_str());
        if patient_changed && identity.has_patient() {
            self.sync.load_history(&identity.patient_id).await;
        }

        tracing::debug!(
            "[Consultation] Identity: room '{}', patient '{}', doctor '{}'",
            identity.room,
            identity.patient_id,
            identity.doctor_id
        );
        identity
    }

    async fn start_session(&self, room: &str) {
        let result = self.lifecycle.lock().await.start(room);
        match result {
            Ok(()) => {}
            Err(MedintelError::WidgetUnavailable(_)) => {
                self.notify(ConsultationNotice::WidgetUnavailable {
                    room: room.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("[Consultation] Session for room '{}' not started: {}", room, e);
            }
        }
    }

    /// Tears the conferencing session down.
    pub async fn unmount(&self) {
        self.lifecycle.lock().await.stop();
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    pub async fn can_prescribe(&self) -> bool {
        self.identity
            .read()
            .await
            .as_ref()
            .is_some_and(Identity::has_doctor)
    }

    pub async fn draft(&self) -> PrescriptionDraft {
        self.draft.lock().await.clone()
    }

    /// Edits one cell of the draft.
    pub async fn set_field(
        &self,
        index: usize,
        field: LineItemField,
        value: impl Into<String>,
    ) -> Result<()> {
        self.draft.lock().await.set_field(index, field, value)
    }

    /// Adds an empty medicine row and returns its index.
    pub async fn add_row(&self) -> usize {
        self.draft.lock().await.add_row()
    }

    /// Saves the draft for the current identity.
    ///
    /// On success the record is already at the top of history and the draft is
    /// reset, unless it was edited while the request was in flight. On failure
    /// the draft is left as it was.
    ///
    /// # Errors
    ///
    /// - `MissingIdentity` before navigation or without a doctor id
    /// - Whatever [`PrescriptionSyncService::save`] returns
    pub async fn save_prescription(&self) -> Result<PrescriptionRecord> {
        let identity = match self.identity().await {
            Some(identity) if identity.has_doctor() => identity,
            Some(_) => return Err(self.save_failed(MedintelError::MissingIdentity("doctor id"))),
            None => return Err(self.save_failed(MedintelError::MissingIdentity("address"))),
        };

        let submitted = self.draft.lock().await.clone();

        match self.sync.save(&identity, submitted.to_items()).await {
            Ok(record) => {
                let mut draft = self.draft.lock().await;
                if *draft == submitted {
                    draft.reset();
                } else {
                    tracing::debug!("[Consultation] Draft edited during save; keeping edits");
                }
                drop(draft);
                self.notify(ConsultationNotice::SaveSucceeded {
                    record: record.clone(),
                });
                Ok(record)
            }
            Err(e) => Err(self.save_failed(e)),
        }
    }

    fn save_failed(&self, error: MedintelError) -> MedintelError {
        tracing::error!("[Consultation] Failed to save prescription: {}", error);
        self.notify(ConsultationNotice::SaveFailed {
            message: error.to_string(),
        });
        error
    }

    /// Past prescriptions in display order, numbered from 1.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.sync
            .history()
            .await
            .into_iter()
            .enumerate()
            .map(|(i, record)| HistoryEntry {
                number: i + 1,
                record,
            })
            .collect()
    }

    pub async fn view(&self) -> ConsultationView {
        let identity = self.identity().await;
        let history = self.history().await;
        ConsultationView {
            can_prescribe: identity.as_ref().is_some_and(Identity::has_doctor),
            identity,
            session: self.lifecycle.lock().await.state(),
            draft: self.draft().await,
            history_is_empty: history.is_empty(),
            history,
        }
    }

    fn notify(&self, notice: ConsultationNotice) {
        // A closed receiver only means nobody is listening any more.
        if self.notices.send(notice).is_err() {
            tracing::debug!("[Consultation] Notice dropped; no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        EventLog, MockBackend, MockConferenceApi, MockContainer, Reply, ToggleHost, events,
    };
    use chrono::Utc;
    use medintel_core::prescription::{LineItem, PrescriptionStatus};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Fixture {
        page: ConsultationPage,
        backend: Arc<MockBackend>,
        log: EventLog,
        notices: UnboundedReceiver<ConsultationNotice>,
    }

    fn fixture_with_host(host: Arc<ToggleHost>, log: EventLog) -> Fixture {
        fixture_with(host, log, MockBackend::new())
    }

    fn fixture_with(host: Arc<ToggleHost>, log: EventLog, backend: MockBackend) -> Fixture {
        let backend = Arc::new(backend);
        let (tx, rx) = mpsc::unbounded_channel();
        let page = ConsultationPage::new(
            &MedintelConfig::default(),
            host,
            Arc::new(MockContainer::new(log.clone())),
            backend.clone(),
            tx,
        );
        Fixture {
            page,
            backend,
            log,
            notices: rx,
        }
    }

    fn fixture() -> Fixture {
        let log: EventLog = Arc::new(std::sync::Mutex::new(Vec::new()));
        let api = Arc::new(MockConferenceApi::new(log.clone()));
        fixture_with_host(Arc::new(ToggleHost::loaded(api)), log)
    }

    fn amoxicillin_record() -> PrescriptionRecord {
        PrescriptionRecord {
            doctor_id: "D1".to_string(),
            patient_id: "P1".to_string(),
            prescriptions: vec![LineItem::new("Amoxicillin", "10", "1-0-1")],
            created_at: Some(Utc::now()),
            status: PrescriptionStatus::Active,
        }
    }

    async fn fill_paracetamol(page: &ConsultationPage) {
        page.set_field(0, LineItemField::Name, "Paracetamol").await.unwrap();
        page.set_field(0, LineItemField::Count, "6").await.unwrap();
        page.set_field(0, LineItemField::Dosage, "1-1-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_navigate_starts_session_and_loads_history() {
        let f = fixture();
        f.backend.push_history(Reply::Ok(vec![amoxicillin_record()]));

        let identity = f.page.navigate("#room42?patientid=P1").await;

        assert_eq!(identity.room, "room42");
        let view = f.page.view().await;
        assert_eq!(
            view.session,
            SessionState::Active {
                room: "room42".to_string()
            }
        );
        assert!(!view.can_prescribe);
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].number, 1);
        assert_eq!(events(&f.log), vec!["clear", "create:room42"]);
    }

    #[tokio::test]
    async fn test_navigation_within_room_keeps_session() {
        let f = fixture();

        f.page.navigate("#room42?patientid=P1").await;
        f.page.navigate("#room42?patientid=P1&doctorid=D1").await;

        let creates = events(&f.log)
            .iter()
            .filter(|e| e.starts_with("create:"))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(f.backend.history_request_count(), 1);
        assert!(f.page.can_prescribe().await);
    }

    #[tokio::test]
    async fn test_room_change_replaces_session() {
        let f = fixture();

        f.page.navigate("#roomA").await;
        f.page.navigate("#roomB").await;

        let log = events(&f.log);
        let dispose_a = log.iter().position(|e| e == "dispose:roomA").unwrap();
        let create_b = log.iter().position(|e| e == "create:roomB").unwrap();
        assert!(dispose_a < create_b);
        assert_eq!(f.backend.history_request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_widget_raises_notice_and_retries_on_next_navigation() {
        let log: EventLog = Arc::new(std::sync::Mutex::new(Vec::new()));
        let host = Arc::new(ToggleHost::missing());
        let mut f = fixture_with_host(host.clone(), log.clone());

        f.page.navigate("#room42").await;

        assert_eq!(
            f.notices.try_recv().unwrap(),
            ConsultationNotice::WidgetUnavailable {
                room: "room42".to_string()
            }
        );
        assert_eq!(f.page.view().await.session, SessionState::Idle);

        host.load(Arc::new(MockConferenceApi::new(log.clone())));
        f.page.navigate("#room42").await;
        assert!(matches!(f.page.view().await.session, SessionState::Active { .. }));
    }

    #[tokio::test]
    async fn test_successful_save_resets_draft_and_prepends() {
        let mut f = fixture();
        f.backend.push_history(Reply::Ok(vec![amoxicillin_record()]));
        f.page.navigate("#room42?patientid=P1&doctorid=D1").await;
        fill_paracetamol(&f.page).await;

        let record = f.page.save_prescription().await.unwrap();

        assert_eq!(f.page.draft().await, PrescriptionDraft::new());
        assert_eq!(
            f.page.draft().await.items(),
            &[LineItem::new("", "", "")]
        );
        let history = f.page.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0].record.prescriptions,
            vec![LineItem::new("Paracetamol", "6", "1-1-1")]
        );
        assert_eq!(history[0].record, record);
        assert_eq!(history[1].number, 2);
        assert!(matches!(
            f.notices.try_recv().unwrap(),
            ConsultationNotice::SaveSucceeded { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft_and_history() {
        let mut f = fixture();
        f.backend.push_history(Reply::Ok(vec![amoxicillin_record()]));
        f.backend
            .push_save(Reply::Err(MedintelError::transport("connection reset")));
        f.page.navigate("#room42?patientid=P1&doctorid=D1").await;
        fill_paracetamol(&f.page).await;
        let draft_before = f.page.draft().await;
        let history_before = f.page.history().await;

        let err = f.page.save_prescription().await.unwrap_err();

        assert!(err.is_backend_failure());
        assert_eq!(f.page.draft().await, draft_before);
        assert_eq!(f.page.history().await, history_before);
        assert!(matches!(
            f.notices.try_recv().unwrap(),
            ConsultationNotice::SaveFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_rows_added_during_save_are_kept() {
        let log: EventLog = Arc::new(std::sync::Mutex::new(Vec::new()));
        let api = Arc::new(MockConferenceApi::new(log.clone()));
        let gate = Arc::new(tokio::sync::Notify::new());
        let f = fixture_with(
            Arc::new(ToggleHost::loaded(api)),
            log,
            MockBackend {
                save_gate: Some(gate.clone()),
                ..MockBackend::default()
            },
        );
        f.page.navigate("#room42?patientid=P1&doctorid=D1").await;
        fill_paracetamol(&f.page).await;

        let (saved, _) = tokio::join!(f.page.save_prescription(), async {
            tokio::task::yield_now().await;
            let index = f.page.add_row().await;
            f.page
                .set_field(index, LineItemField::Name, "Cetirizine")
                .await
                .unwrap();
            gate.notify_one();
        });

        let saved = saved.unwrap();
        assert_eq!(
            saved.prescriptions,
            vec![LineItem::new("Paracetamol", "6", "1-1-1")]
        );
        let draft = f.page.draft().await;
        assert_eq!(draft.len(), 2);
        assert_eq!(draft.items()[1].name, "Cetirizine");
    }

    #[tokio::test]
    async fn test_save_without_doctor_sends_nothing() {
        let mut f = fixture();
        f.page.navigate("#room42?patientid=P1").await;
        fill_paracetamol(&f.page).await;

        let err = f.page.save_prescription().await.unwrap_err();

        assert!(matches!(err, MedintelError::MissingIdentity(_)));
        assert_eq!(f.backend.save_request_count(), 0);
        assert_eq!(f.page.draft().await.items()[0].name, "Paracetamol");
        assert!(matches!(
            f.notices.try_recv().unwrap(),
            ConsultationNotice::SaveFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unmount_disposes_and_is_idempotent() {
        let f = fixture();
        f.page.navigate("#room42").await;

        f.page.unmount().await;
        f.page.unmount().await;

        assert_eq!(
            events(&f.log),
            vec!["clear", "create:room42", "dispose:room42", "clear"]
        );
    }

    #[tokio::test]
    async fn test_dropping_page_releases_session() {
        let f = fixture();
        f.page.navigate("#room42").await;
        let log = f.log.clone();

        drop(f);

        assert_eq!(events(&log).last().map(String::as_str), Some("clear"));
        assert!(events(&log).contains(&"dispose:room42".to_string()));
    }

    #[tokio::test]
    async fn test_add_row_edits_only_new_row() {
        let f = fixture();
        fill_paracetamol(&f.page).await;

        let index = f.page.add_row().await;
        f.page
            .set_field(index, LineItemField::Name, "Cetirizine")
            .await
            .unwrap();

        let draft = f.page.draft().await;
        assert_eq!(draft.items()[0], LineItem::new("Paracetamol", "6", "1-1-1"));
        assert_eq!(draft.items()[1], LineItem::new("Cetirizine", "", ""));
    }

    #[tokio::test]
    async fn test_view_serializes_for_frontend() {
        let f = fixture();
        f.page.navigate("#room42?patientid=P1&doctorid=D1").await;

        let json = serde_json::to_value(f.page.view().await).unwrap();

        assert_eq!(json["session"]["state"], "active");
        assert_eq!(json["session"]["room"], "room42");
        assert_eq!(json["can_prescribe"], true);
        assert_eq!(json["draft"]["items"][0]["name"], "");
        assert_eq!(json["history_is_empty"], true);
    }
}
