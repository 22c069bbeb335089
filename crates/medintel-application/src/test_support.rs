//! Hand-written doubles for the conferencing and backend seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use medintel_core::conference::{
    ConferenceApi, ConferenceHandle, ConferenceHost, ConferenceOptions, WidgetContainer,
};
use medintel_core::error::{MedintelError, Result};
use medintel_core::prescription::{PrescriptionBackend, PrescriptionPayload, PrescriptionRecord};
use tokio::sync::Notify;

/// Ordered log shared by every widget double.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub struct MockContainer {
    log: EventLog,
}

impl MockContainer {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl WidgetContainer for MockContainer {
    fn id(&self) -> &str {
        "jitsi-container"
    }

    fn clear(&self) {
        self.log.lock().unwrap().push("clear".to_string());
    }
}

struct MockHandle {
    room: String,
    log: EventLog,
}

impl ConferenceHandle for MockHandle {
    fn dispose(&mut self) {
        self.log.lock().unwrap().push(format!("dispose:{}", self.room));
    }
}

pub struct MockConferenceApi {
    log: EventLog,
    pub created: Mutex<Vec<(String, ConferenceOptions)>>,
    pub fail_rooms: Vec<String>,
}

impl MockConferenceApi {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            created: Mutex::new(Vec::new()),
            fail_rooms: Vec::new(),
        }
    }
}

impl ConferenceApi for MockConferenceApi {
    fn create(
        &self,
        domain: &str,
        _container: &dyn WidgetContainer,
        options: &ConferenceOptions,
    ) -> Result<Box<dyn ConferenceHandle>> {
        if self.fail_rooms.contains(&options.room_name) {
            return Err(MedintelError::internal("widget refused room"));
        }
        self.log
            .lock()
            .unwrap()
            .push(format!("create:{}", options.room_name));
        self.created
            .lock()
            .unwrap()
            .push((domain.to_string(), options.clone()));
        Ok(Box::new(MockHandle {
            room: options.room_name.clone(),
            log: self.log.clone(),
        }))
    }
}

/// Host whose widget constructor can appear after construction.
pub struct ToggleHost {
    api: Mutex<Option<Arc<dyn ConferenceApi>>>,
}

impl ToggleHost {
    pub fn loaded(api: Arc<dyn ConferenceApi>) -> Self {
        Self {
            api: Mutex::new(Some(api)),
        }
    }

    pub fn missing() -> Self {
        Self {
            api: Mutex::new(None),
        }
    }

    pub fn load(&self, api: Arc<dyn ConferenceApi>) {
        *self.api.lock().unwrap() = Some(api);
    }
}

impl ConferenceHost for ToggleHost {
    fn conference_api(&self) -> Option<Arc<dyn ConferenceApi>> {
        self.api.lock().unwrap().clone()
    }
}

/// Scripted backend response.
pub enum Reply<T> {
    Ok(T),
    Err(MedintelError),
}

/// Backend that replays scripted replies and records every request.
///
/// When `gate` is set, each call waits for one `notify_one` before replying.
#[derive(Default)]
pub struct MockBackend {
    pub history_replies: Mutex<VecDeque<Reply<Vec<PrescriptionRecord>>>>,
    pub save_replies: Mutex<VecDeque<Reply<serde_json::Value>>>,
    pub history_requests: Mutex<Vec<String>>,
    pub save_requests: Mutex<Vec<PrescriptionPayload>>,
    pub history_gate: Option<Arc<Notify>>,
    pub save_gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_history(&self, reply: Reply<Vec<PrescriptionRecord>>) {
        self.history_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_save(&self, reply: Reply<serde_json::Value>) {
        self.save_replies.lock().unwrap().push_back(reply);
    }

    pub fn history_request_count(&self) -> usize {
        self.history_requests.lock().unwrap().len()
    }

    pub fn save_request_count(&self) -> usize {
        self.save_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PrescriptionBackend for MockBackend {
    async fn fetch_history(&self, patient_id: &str) -> Result<Vec<PrescriptionRecord>> {
        self.history_requests
            .lock()
            .unwrap()
            .push(patient_id.to_string());
        let reply = self.history_replies.lock().unwrap().pop_front();
        if let Some(gate) = &self.history_gate {
            gate.notified().await;
        }
        match reply {
            Some(Reply::Ok(records)) => Ok(records),
            Some(Reply::Err(e)) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    async fn save_prescription(&self, payload: &PrescriptionPayload) -> Result<serde_json::Value> {
        self.save_requests.lock().unwrap().push(payload.clone());
        let reply = self.save_replies.lock().unwrap().pop_front();
        if let Some(gate) = &self.save_gate {
            gate.notified().await;
        }
        match reply {
            Some(Reply::Ok(body)) => Ok(body),
            Some(Reply::Err(e)) => Err(e),
            None => Ok(serde_json::json!({ "message": "Prescription added" })),
        }
    }
}
