//! HttpPrescriptionBackend - REST client for the prescription service.
//!
//! Endpoints:
//! - `GET  {base}/get-prescriptions/{patient_id}`
//! - `POST {base}/add-prescription`

use std::time::Duration;

use async_trait::async_trait;
use medintel_core::config::BackendConfig;
use medintel_core::error::{MedintelError, Result};
use medintel_core::prescription::{
    HistoryResponse, PrescriptionBackend, PrescriptionPayload, PrescriptionRecord,
};
use reqwest::Client;

/// Prescription backend that talks JSON over HTTP.
#[derive(Clone)]
pub struct HttpPrescriptionBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPrescriptionBackend {
    /// Creates a backend rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.base_url.clone()).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_url(&self, patient_id: &str) -> String {
        format!(
            "{}/get-prescriptions/{}",
            self.base_url,
            urlencoding::encode(patient_id)
        )
    }

    fn save_url(&self) -> String {
        format!("{}/add-prescription", self.base_url)
    }

    /// Turns a non-success response into `MedintelError::Http`.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(MedintelError::http(status.as_u16(), error_text))
    }
}

/// Keeps every entry that parses; the rest are logged and skipped.
fn collect_records(body: HistoryResponse, patient_id: &str) -> Vec<PrescriptionRecord> {
    let mut records = Vec::with_capacity(body.prescriptions.len());
    for (index, entry) in body.into_records().enumerate() {
        match entry {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(
                "[HttpBackend] Skipping malformed prescription #{} for patient {}: {}",
                index + 1,
                patient_id,
                e
            ),
        }
    }
    records
}

#[async_trait]
impl PrescriptionBackend for HttpPrescriptionBackend {
    async fn fetch_history(&self, patient_id: &str) -> Result<Vec<PrescriptionRecord>> {
        let url = self.history_url(patient_id);
        tracing::debug!("[HttpBackend] GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                MedintelError::transport(format!("Failed to fetch prescriptions: {}", e))
            })?;

        let response = Self::check_status(response).await?;

        let body: HistoryResponse = response.json().await.map_err(|e| {
            MedintelError::transport(format!("Failed to parse prescriptions response: {}", e))
        })?;

        Ok(collect_records(body, patient_id))
    }

    async fn save_prescription(&self, payload: &PrescriptionPayload) -> Result<serde_json::Value> {
        let url = self.save_url();
        tracing::debug!(
            "[HttpBackend] POST {} ({} line items)",
            url,
            payload.prescriptions.len()
        );

        let response = self
            .client
            .post(&url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MedintelError::transport(format!("Failed to save prescription: {}", e)))?;

        let response = Self::check_status(response).await?;

        // The body only confirms success; an empty or non-JSON body is fine.
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}
