//! Turn Event Logger
//!
//! One structured record per query lifecycle step, emitted under the
//! `turn_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    QueryReceived {
        query: String,
        document: String,
        temperature: f32,
    },
    Answered {
        answer: String,
        latency_ms: u64,
    },
    Failed {
        code: String,
        error_msg: String,
    },
}

impl TurnEvent {
    fn redact(&mut self) {
        match self {
            TurnEvent::QueryReceived { query, .. } => *query = redact_sensitive_data(query),
            TurnEvent::Answered { answer, .. } => *answer = redact_sensitive_data(answer),
            TurnEvent::Failed { error_msg, .. } => *error_msg = redact_sensitive_data(error_msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: TurnEvent,
}

pub struct TurnLogger;

impl TurnLogger {
    /// Redact and emit one event. Returns the entry as logged.
    pub fn log_event(session_id: &str, mut event: TurnEvent) -> TurnLogEntry {
        event.redact();
        let entry = TurnLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let record = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            TurnEvent::Failed { .. } => {
                warn!(target: "turn_events", session_id = %entry.session_id, record = %record, "Turn event")
            }
            _ => {
                info!(target: "turn_events", session_id = %entry.session_id, record = %record, "Turn event")
            }
        }
        entry
    }
}
