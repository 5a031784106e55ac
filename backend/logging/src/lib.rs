//! Structured logging for DocQuery.
//!
//! Handles subscriber setup with optional JSON file rotation, secret
//! redaction, and per-turn event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{TurnEvent, TurnLogEntry, TurnLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
