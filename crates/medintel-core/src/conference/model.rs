use serde::{Serialize, Serializer};

use crate::config::{ConferenceConfig, WidgetHeight};

/// A CSS-style size understood by the widget constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Percent(u8),
    Pixels(u32),
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dimension::Percent(pct) => serializer.serialize_str(&format!("{}%", pct)),
            Dimension::Pixels(px) => serializer.serialize_u32(*px),
        }
    }
}

impl From<WidgetHeight> for Dimension {
    fn from(height: WidgetHeight) -> Self {
        match height {
            WidgetHeight::Full => Dimension::Percent(100),
            WidgetHeight::Pixels(px) => Dimension::Pixels(px),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceConfigOverwrite {
    #[serde(rename = "SHOW_JITSI_WATERMARK")]
    pub show_jitsi_watermark: bool,
    #[serde(rename = "SHOW_BRAND_WATERMARK")]
    pub show_brand_watermark: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverwrite {
    pub start_with_audio_muted: bool,
}

/// Options handed to the widget constructor, minus the parent node which is
/// passed separately as the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceOptions {
    pub room_name: String,
    pub width: Dimension,
    pub height: Dimension,
    pub interface_config_overwrite: InterfaceConfigOverwrite,
    pub config_overwrite: ConfigOverwrite,
}

/// The fixed widget configuration of one deployment.
///
/// Only the room name varies between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceProfile {
    pub domain: String,
    height: Dimension,
    show_branding: bool,
    start_with_audio_muted: bool,
}

impl ConferenceProfile {
    pub fn new(config: &ConferenceConfig) -> Self {
        Self {
            domain: config.domain.clone(),
            height: config.height.into(),
            show_branding: config.show_branding,
            start_with_audio_muted: config.start_with_audio_muted,
        }
    }

    pub fn options_for(&self, room: &str) -> ConferenceOptions {
        ConferenceOptions {
            room_name: room.to_string(),
            width: Dimension::Percent(100),
            height: self.height,
            interface_config_overwrite: InterfaceConfigOverwrite {
                show_jitsi_watermark: self.show_branding,
                show_brand_watermark: self.show_branding,
            },
            config_overwrite: ConfigOverwrite {
                start_with_audio_muted: self.start_with_audio_muted,
            },
        }
    }
}

impl Default for ConferenceProfile {
    fn default() -> Self {
        Self::new(&ConferenceConfig::default())
    }
}
