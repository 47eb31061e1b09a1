//! Session state management.
//!
//! `SessionTracker` holds the one open session (if any):
//! - `start_time` in ms since epoch, `0` while idle
//! - `lifecycle_events`, the metadata of the open session, empty while idle
//!
//! Starting while a session is open replaces it without an end record.
//! Ending while idle does nothing.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::events::{AnalyticsEvent, ClosedBy, EventLog};
use crate::metadata::{keys, Metadata};
use crate::platform::Clock;

/// Snapshot of the tracker, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether a session is currently open
    pub active_session: bool,
    /// Current session ID if active
    pub session_id: Option<String>,
    /// Session start (ms since epoch), 0 when idle
    pub start_time: i64,
    /// Milliseconds since the session started
    pub elapsed_ms: Option<i64>,
}

#[derive(Debug, Default)]
struct SessionState {
    start_time: i64,
    lifecycle_events: Metadata,
    /// Start time handed out by the previous start, for monotonicity
    last_start_time: i64,
}

impl SessionState {
    fn is_active(&self) -> bool {
        !self.lifecycle_events.is_empty()
    }

    fn session_id(&self) -> Option<String> {
        self.lifecycle_events
            .get(keys::KEY_SESSION_ID)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

pub struct SessionTracker {
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
    /// Where finished sessions are recorded
    event_log: Arc<EventLog>,
}

impl SessionTracker {
    pub fn new(clock: Arc<dyn Clock>, event_log: Arc<EventLog>) -> Self {
        Self {
            clock,
            state: RwLock::new(SessionState::default()),
            event_log,
        }
    }

    /// Open a new session and return its id.
    pub fn log_session_start(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut state = self.state.write();

        // Never go backwards, and never use 0 since it means "idle"
        let start_time = self
            .clock
            .now_millis()
            .max(state.last_start_time)
            .max(1);

        if let Some(previous) = state.session_id() {
            tracing::debug!(
                "[session] Session {} replaced by {} without an end record",
                previous,
                session_id
            );
        }

        let mut lifecycle_events = Metadata::new();
        lifecycle_events.insert(
            keys::KEY_CATEGORY.to_string(),
            json!(keys::CATEGORY_APP_SESSION),
        );
        lifecycle_events.insert(keys::KEY_SESSION_ID.to_string(), json!(session_id));
        lifecycle_events.insert(keys::KEY_TIMESTAMP.to_string(), json!(start_time));

        state.start_time = start_time;
        state.last_start_time = start_time;
        state.lifecycle_events = lifecycle_events;

        tracing::info!("[session] Session {} started at {}", session_id, start_time);
        session_id
    }

    /// Close the open session as ended by the user.
    pub fn log_session_end(&self) -> Option<AnalyticsEvent> {
        self.end_session(ClosedBy::User)
    }

    /// Close the open session, recording how it ended.
    ///
    /// Returns the recorded event, or `None` when no session was open.
    pub fn end_session(&self, closed_by: ClosedBy) -> Option<AnalyticsEvent> {
        let mut state = self.state.write();
        self.finish(&mut state, closed_by)
    }

    /// Crash-path variant of [`end_session`](Self::end_session). Gives up
    /// instead of blocking if the state lock is held, since the crashing
    /// thread may be the one holding it.
    pub(crate) fn end_session_after_crash(&self) -> Option<AnalyticsEvent> {
        let mut state = self.state.try_write()?;
        self.finish(&mut state, ClosedBy::Crash)
    }

    fn finish(&self, state: &mut SessionState, closed_by: ClosedBy) -> Option<AnalyticsEvent> {
        if !state.is_active() {
            tracing::debug!("[session] No active session to end");
            return None;
        }

        let now = self.clock.now_millis();
        let duration = now - state.start_time;

        let mut metadata = std::mem::take(&mut state.lifecycle_events);
        metadata.insert(keys::KEY_DURATION.to_string(), json!(duration));
        metadata.insert(keys::KEY_CLOSED_BY.to_string(), json!(closed_by.as_str()));
        state.start_time = 0;

        let event = AnalyticsEvent::new(now, metadata);
        tracing::info!(
            "[session] Session ended ({}ms, closed by {})",
            duration,
            closed_by.as_str()
        );
        self.event_log.record(event.clone());
        Some(event)
    }

    /// Start of the open session (ms since epoch), or 0 while idle.
    pub fn start_time(&self) -> i64 {
        self.state.read().start_time
    }

    /// Metadata of the open session; empty while idle.
    pub fn lifecycle_events(&self) -> Metadata {
        self.state.read().lifecycle_events.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.read().session_id()
    }

    pub fn is_active(&self) -> bool {
        self.state.read().is_active()
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.read();
        let active = state.is_active();

        SessionStatus {
            active_session: active,
            session_id: state.session_id(),
            start_time: state.start_time,
            elapsed_ms: active.then(|| self.clock.now_millis() - state.start_time),
        }
    }

    /// Drop all session state without recording anything.
    pub fn reset(&self) {
        *self.state.write() = SessionState::default();
    }
}
