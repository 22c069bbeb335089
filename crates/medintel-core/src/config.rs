//! Configuration model shared by every layer.
//!
//! The values here replace literals that would otherwise be baked into the
//! consultation logic: the backend base address, the conferencing deployment
//! variant and the address keys used to find patient and doctor ids.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONFERENCE_DOMAIN: &str = "meet.jit.si";
pub const DEFAULT_ROOM_NAME: &str = "defaultRoom";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct MedintelConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub conference: ConferenceConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Prescription backend endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base address both endpoints are joined onto.
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Height of the embedded widget.
///
/// Serialized as `"full"` or as a bare pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetHeight {
    #[default]
    Full,
    Pixels(u32),
}

impl Serialize for WidgetHeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WidgetHeight::Full => serializer.serialize_str("full"),
            WidgetHeight::Pixels(px) => serializer.serialize_u32(*px),
        }
    }
}

impl<'de> Deserialize<'de> for WidgetHeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Keyword(String),
            Pixels(u32),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Pixels(px) => Ok(WidgetHeight::Pixels(px)),
            Raw::Keyword(word) if word.eq_ignore_ascii_case("full") => Ok(WidgetHeight::Full),
            Raw::Keyword(word) => Err(D::Error::custom(format!(
                "widget height must be \"full\" or a pixel count, got \"{}\"",
                word
            ))),
        }
    }
}

/// Conferencing deployment variant.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConferenceConfig {
    #[serde(default = "default_conference_domain")]
    pub domain: String,
    #[serde(default)]
    pub height: WidgetHeight,
    #[serde(default = "default_true")]
    pub start_with_audio_muted: bool,
    #[serde(default)]
    pub show_branding: bool,
}

impl Default for ConferenceConfig {
    fn default() -> Self {
        Self {
            domain: default_conference_domain(),
            height: WidgetHeight::Full,
            start_with_audio_muted: true,
            show_branding: false,
        }
    }
}

/// How identity is read from the address fragment.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct IdentityConfig {
    #[serde(default = "default_room_name")]
    pub default_room: String,
    /// Query keys tried in order for the patient id.
    #[serde(default = "default_patient_keys")]
    pub patient_keys: Vec<String>,
    /// Query keys tried in order for the doctor id.
    #[serde(default = "default_doctor_keys")]
    pub doctor_keys: Vec<String>,
    /// Doctor id used when the address does not carry one.
    #[serde(default)]
    pub fallback_doctor_id: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_room: default_room_name(),
            patient_keys: default_patient_keys(),
            doctor_keys: default_doctor_keys(),
            fallback_doctor_id: None,
        }
    }
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_conference_domain() -> String {
    DEFAULT_CONFERENCE_DOMAIN.to_string()
}

fn default_room_name() -> String {
    DEFAULT_ROOM_NAME.to_string()
}

fn default_patient_keys() -> Vec<String> {
    vec!["patientid".to_string(), "patient".to_string()]
}

fn default_doctor_keys() -> Vec<String> {
    vec!["doctorid".to_string(), "doctor".to_string()]
}

fn default_true() -> bool {
    true
}
