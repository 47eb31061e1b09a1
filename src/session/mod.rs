//! Application session lifecycle tracking.
//!
//! A session runs from `log_session_start()` to the next
//! `log_session_end()` (or the next start, which silently replaces it).
//! Finished sessions are recorded as `appSession` events in the
//! [`EventLog`], carrying `$duration` and `$closedBy`.

pub mod events;
pub mod state;

pub use events::{AnalyticsEvent, ClosedBy, EventLog, DEFAULT_MAX_BUFFERED_EVENTS};
pub use state::{SessionStatus, SessionTracker};
