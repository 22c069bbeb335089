//! Conferencing widget: creation options and host capability traits.

mod capability;
mod model;

pub use capability::{
    ConferenceApi, ConferenceHandle, ConferenceHost, HeadlessHost, StaticHost, WidgetContainer,
};
pub use model::{
    ConferenceOptions, ConferenceProfile, ConfigOverwrite, Dimension, InterfaceConfigOverwrite,
};
