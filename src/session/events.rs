//! Recorded analytics events and the in-memory log that buffers them until
//! the host's uploader drains it.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metadata::{keys, Metadata};

/// Default upper bound on buffered events.
pub const DEFAULT_MAX_BUFFERED_EVENTS: usize = 1000;

/// How a session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosedBy {
    /// Normal end, e.g. the app moved to the background
    User,
    /// The process crashed while the session was open
    Crash,
}

impl ClosedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosedBy::User => "USER",
            ClosedBy::Crash => "CRASH",
        }
    }
}

/// One analytics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Unique identifier for this record
    pub id: Uuid,
    /// When the record was made (ms since epoch)
    pub timestamp: i64,
    /// Backend-facing key/value payload
    pub metadata: Metadata,
}

impl AnalyticsEvent {
    pub fn new(timestamp: i64, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            metadata,
        }
    }

    /// The `$category` field, if set.
    pub fn category(&self) -> Option<&str> {
        self.metadata
            .get(keys::KEY_CATEGORY)
            .and_then(|v| v.as_str())
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Bounded FIFO of recorded events. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventLog {
    events: RwLock<VecDeque<AnalyticsEvent>>,
    /// Maximum buffered events (0 = unlimited)
    capacity: RwLock<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_BUFFERED_EVENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            capacity: RwLock::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        *self.capacity.read()
    }

    /// Change the bound. Excess events are dropped oldest-first.
    pub fn set_capacity(&self, capacity: usize) {
        *self.capacity.write() = capacity;
        let mut events = self.events.write();
        Self::enforce_capacity(&mut events, capacity);
    }

    pub fn record(&self, event: AnalyticsEvent) {
        let capacity = self.capacity();
        let mut events = self.events.write();

        tracing::trace!(
            "[events] Recording {} event {}",
            event.category().unwrap_or("custom"),
            event.id
        );
        events.push_back(event);
        Self::enforce_capacity(&mut events, capacity);
    }

    fn enforce_capacity(events: &mut VecDeque<AnalyticsEvent>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        let overflow = events.len().saturating_sub(capacity);
        if overflow > 0 {
            events.drain(..overflow);
            tracing::warn!(
                "[events] Buffer full ({}), dropped {} oldest event(s)",
                capacity,
                overflow
            );
        }
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<AnalyticsEvent> {
        self.events.write().drain(..).collect()
    }

    /// Copy of the buffered events without removing them.
    pub fn snapshot(&self) -> Vec<AnalyticsEvent> {
        self.events.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(n: i64) -> AnalyticsEvent {
        let mut metadata = Metadata::new();
        metadata.insert("n".to_string(), json!(n));
        AnalyticsEvent::new(n, metadata)
    }

    #[test]
    fn test_closed_by_wire_format() {
        assert_eq!(ClosedBy::User.as_str(), "USER");
        assert_eq!(serde_json::to_string(&ClosedBy::Crash).unwrap(), "\"CRASH\"");
    }

    #[test]
    fn test_event_category() {
        let mut metadata = Metadata::new();
        metadata.insert(keys::KEY_CATEGORY.to_string(), json!("network"));
        let event = AnalyticsEvent::new(1_700_000_000_000, metadata);

        assert_eq!(event.category(), Some("network"));
        assert_eq!(
            event.recorded_at().unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn test_drain_empties_log() {
        let log = EventLog::new();
        log.record(event(1));
        log.record(event(2));
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].timestamp, 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = EventLog::with_capacity(2);
        log.record(event(1));
        log.record(event(2));
        log.record(event(3));

        let timestamps: Vec<i64> = log.snapshot().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3]);

        log.set_capacity(1);
        assert_eq!(log.snapshot()[0].timestamp, 3);
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let log = EventLog::with_capacity(0);
        for n in 0..50 {
            log.record(event(n));
        }
        assert_eq!(log.len(), 50);
    }
}
