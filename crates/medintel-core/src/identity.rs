//! Identity resolution from the page address fragment.
//!
//! A fragment looks like `#room42?patientid=P1&doctorid=D7`. The path segment
//! names the conferencing room; the query-style part carries the patient and
//! doctor ids.

use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

/// Room, patient and doctor derived from one address value.
///
/// `room` is never empty. An empty `patient_id` or `doctor_id` means the
/// address did not name one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub room: String,
    pub patient_id: String,
    pub doctor_id: String,
}

impl Identity {
    pub fn has_patient(&self) -> bool {
        !self.patient_id.is_empty()
    }

    pub fn has_doctor(&self) -> bool {
        !self.doctor_id.is_empty()
    }
}

/// Parses address fragments into [`Identity`] values.
///
/// Resolution is a pure function of the fragment; callers re-run it on every
/// navigation instead of caching the result.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    default_room: String,
    patient_keys: Vec<String>,
    doctor_keys: Vec<String>,
    fallback_doctor_id: Option<String>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(&IdentityConfig::default())
    }
}

impl IdentityResolver {
    pub fn new(config: &IdentityConfig) -> Self {
        let default_room = if config.default_room.is_empty() {
            crate::config::DEFAULT_ROOM_NAME.to_string()
        } else {
            config.default_room.clone()
        };

        Self {
            default_room,
            patient_keys: config.patient_keys.clone(),
            doctor_keys: config.doctor_keys.clone(),
            fallback_doctor_id: config
                .fallback_doctor_id
                .clone()
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// Resolves a fragment such as `#room42?patientid=P1`.
    ///
    /// The leading `#` is optional. Never fails: malformed query text yields
    /// empty ids.
    pub fn resolve(&self, fragment: &str) -> Identity {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

        let (path, query) = match fragment.find('?') {
            Some(index) => (&fragment[..index], &fragment[index + 1..]),
            None => (fragment, ""),
        };

        let room = if path.is_empty() {
            self.default_room.clone()
        } else {
            path.to_string()
        };

        let params = QueryParams::parse(query);
        let patient_id = params.first_of(&self.patient_keys).unwrap_or_default();
        let doctor_id = params
            .first_of(&self.doctor_keys)
            .or_else(|| self.fallback_doctor_id.clone())
            .unwrap_or_default();

        Identity {
            room,
            patient_id,
            doctor_id,
        }
    }
}

/// Decoded `key=value` pairs in address order.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        // form_urlencoded never errors; bad escapes pass through and invalid
        // UTF-8 is replaced.
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `keys`, tried in order.
    fn first_of(&self, keys: &[String]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}
