//! Seams to the host-provided conferencing widget.
//!
//! The widget constructor only exists when the host has loaded it, so access
//! goes through [`ConferenceHost`], which may report the capability as absent.

use std::sync::Arc;

use super::model::ConferenceOptions;
use crate::error::Result;

/// The element the widget renders into.
pub trait WidgetContainer: Send + Sync {
    /// Stable id of the element, used in log lines.
    fn id(&self) -> &str;

    /// Removes everything rendered inside the element.
    fn clear(&self);
}

/// A live embedded conferencing session.
pub trait ConferenceHandle: Send {
    /// Tears the session down. Called at most once per handle.
    fn dispose(&mut self);
}

/// The widget constructor.
pub trait ConferenceApi: Send + Sync {
    /// Embeds a session for `options.room_name` inside `container`.
    fn create(
        &self,
        domain: &str,
        container: &dyn WidgetContainer,
        options: &ConferenceOptions,
    ) -> Result<Box<dyn ConferenceHandle>>;
}

/// Reports whether the widget constructor is loaded.
pub trait ConferenceHost: Send + Sync {
    /// Returns the constructor if the host has it loaded right now.
    fn conference_api(&self) -> Option<Arc<dyn ConferenceApi>>;
}

/// Host without a conferencing widget (tests, command line).
pub struct HeadlessHost;

impl ConferenceHost for HeadlessHost {
    fn conference_api(&self) -> Option<Arc<dyn ConferenceApi>> {
        None
    }
}

/// Host whose widget constructor is known up front.
pub struct StaticHost(pub Arc<dyn ConferenceApi>);

impl ConferenceHost for StaticHost {
    fn conference_api(&self) -> Option<Arc<dyn ConferenceApi>> {
        Some(self.0.clone())
    }
}
