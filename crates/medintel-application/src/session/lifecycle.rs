use std::sync::Arc;

use medintel_core::conference::{
    ConferenceHandle, ConferenceHost, ConferenceProfile, WidgetContainer,
};
use medintel_core::error::{MedintelError, Result};
use serde::Serialize;
use uuid::Uuid;

/// Observable state of the embedded conferencing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active { room: String },
}

struct ActiveSession {
    /// Local id for correlating create/dispose log lines.
    id: Uuid,
    room: String,
    handle: Box<dyn ConferenceHandle>,
}

/// Owns the conferencing widget handle for one container.
///
/// `SessionLifecycleManager` is responsible for:
/// - Creating the widget when a room becomes known
/// - Replacing it (dispose, clear, create) when the room changes
/// - Releasing it on [`stop`](Self::stop) or when the manager is dropped
///
/// At most one handle is alive at any time, and the previous one is fully
/// disposed before a replacement is created.
pub struct SessionLifecycleManager {
    host: Arc<dyn ConferenceHost>,
    container: Arc<dyn WidgetContainer>,
    profile: ConferenceProfile,
    active: Option<ActiveSession>,
}

impl SessionLifecycleManager {
    /// Creates an idle manager.
    ///
    /// # Arguments
    ///
    /// * `host` - Supplies the widget constructor, if loaded
    /// * `container` - Element the widget renders into; owned by this manager
    /// * `profile` - Fixed widget options of the deployment
    pub fn new(
        host: Arc<dyn ConferenceHost>,
        container: Arc<dyn WidgetContainer>,
        profile: ConferenceProfile,
    ) -> Self {
        Self {
            host,
            container,
            profile,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(active) => SessionState::Active {
                room: active.room.clone(),
            },
            None => SessionState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Room of the live session, if any.
    pub fn room(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.room.as_str())
    }

    /// Ensures a session for `room` is running.
    ///
    /// Starting the room that is already active is a no-op. A different room
    /// stops the current session first.
    ///
    /// # Errors
    ///
    /// - `WidgetUnavailable` if the host has no widget constructor; the manager
    ///   stays idle and does not retry
    /// - `InvalidInput` for an empty room name
    /// - Any error returned by the constructor; the manager stays idle
    pub fn start(&mut self, room: &str) -> Result<()> {
        if room.is_empty() {
            return Err(MedintelError::invalid_input("room name must not be empty"));
        }

        if self.room() == Some(room) {
            tracing::debug!("[SessionLifecycle] Room '{}' already active", room);
            return Ok(());
        }

        self.stop();
        // Remounts can leave stale markup behind even when no handle is held.
        self.container.clear();

        let Some(api) = self.host.conference_api() else {
            tracing::error!(
                "[SessionLifecycle] Conferencing API not loaded; room '{}' not started",
                room
            );
            return Err(MedintelError::widget_unavailable(format!(
                "conferencing API not loaded (room '{}')",
                room
            )));
        };

        let options = self.profile.options_for(room);
        let handle = api
            .create(&self.profile.domain, self.container.as_ref(), &options)
            .inspect_err(|e| {
                tracing::error!(
                    "[SessionLifecycle] Failed to create session for room '{}': {}",
                    room,
                    e
                )
            })?;

        let id = Uuid::new_v4();
        tracing::info!(
            "[SessionLifecycle] Session {} started: room '{}' on {} in #{}",
            id,
            room,
            self.profile.domain,
            self.container.id()
        );

        self.active = Some(ActiveSession {
            id,
            room: room.to_string(),
            handle,
        });
        Ok(())
    }

    /// Disposes the live session and clears the container.
    ///
    /// Returns `false` (and does nothing) when already idle.
    pub fn stop(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        active.handle.dispose();
        self.container.clear();

        tracing::info!(
            "[SessionLifecycle] Session {} stopped: room '{}'",
            active.id,
            active.room
        );
        true
    }
}

impl Drop for SessionLifecycleManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
