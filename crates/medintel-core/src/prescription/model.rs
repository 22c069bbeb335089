use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MedintelError;

/// One drug entry. All fields are free text.
///
/// Numbers and booleans sent by the backend are read as their text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub count: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dosage: String,
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Number(number)) => number.to_string(),
        Some(Raw::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

/// Reads RFC 3339 timestamps, and naive ISO timestamps as UTC.
/// Anything else becomes `None`.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| naive.and_utc()))
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        count: impl Into<String>,
        dosage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            count: count.into(),
            dosage: dosage.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.count.is_empty() && self.dosage.is_empty()
    }

    pub(crate) fn field_mut(&mut self, field: LineItemField) -> &mut String {
        match field {
            LineItemField::Name => &mut self.name,
            LineItemField::Count => &mut self.count,
            LineItemField::Dosage => &mut self.dosage,
        }
    }
}

/// Addressable cell of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemField {
    Name,
    Count,
    Dosage,
}

impl std::str::FromStr for LineItemField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" | "medicine" => Ok(Self::Name),
            "count" => Ok(Self::Count),
            "dosage" => Ok(Self::Dosage),
            other => Err(format!("unknown line item field: {}", other)),
        }
    }
}

/// Lifecycle status of a saved prescription.
///
/// Records saved here are always `active`; other values from the backend are
/// kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Other(String),
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Other(status) => status,
        }
    }
}

impl Serialize for PrescriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PrescriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => Self::Active,
            Some(status) if status.eq_ignore_ascii_case("active") => Self::Active,
            Some(status) => Self::Other(status),
        })
    }
}

/// Body of the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionPayload {
    #[serde(rename = "doctorid", alias = "doctorId")]
    pub doctor_id: String,
    #[serde(rename = "patientid", alias = "patientId")]
    pub patient_id: String,
    pub prescriptions: Vec<LineItem>,
}

/// A saved prescription as shown in the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    #[serde(rename = "doctorid", alias = "doctorId", default)]
    pub doctor_id: String,
    #[serde(rename = "patientid", alias = "patientId", default)]
    pub patient_id: String,
    #[serde(default)]
    pub prescriptions: Vec<LineItem>,
    /// `None` when the backend sent no usable timestamp.
    #[serde(alias = "createdAt", default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PrescriptionStatus,
}

impl PrescriptionRecord {
    /// Builds the display copy of a payload the backend just accepted.
    pub fn from_payload(payload: PrescriptionPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            doctor_id: payload.doctor_id,
            patient_id: payload.patient_id,
            prescriptions: payload.prescriptions,
            created_at: Some(created_at),
            status: PrescriptionStatus::Active,
        }
    }
}

/// Response body of the fetch-history endpoint.
///
/// Entries are kept raw so one malformed record does not hide the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub prescriptions: Vec<serde_json::Value>,
}

impl HistoryResponse {
    /// Parses each entry on its own, in response order.
    pub fn into_records(
        self,
    ) -> impl Iterator<Item = std::result::Result<PrescriptionRecord, MedintelError>> {
        self.prescriptions
            .into_iter()
            .map(|entry| serde_json::from_value(entry).map_err(MedintelError::from))
    }
}
