//! Dashboard event log: an in-memory audit trail of what the user did.
//!
//! Nothing here is persisted; the log lives as long as the Dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashEvent {
    // ── Metrics ───────────────────────────────────
    MetricChanged {
        field:     String,
        requested: f64,
        applied:   f64,
        clamped:   bool,
    },
    MetricsReset,
    CommandRejected {
        command: String,
        reason:  String,
    },

    // ── Access ────────────────────────────────────
    LoginSucceeded {
        email: String,
    },
    LoginFailed {
        email:   String,
        message: String,
    },
    LoggedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub seq:   u64,
    pub at:    DateTime<Utc>,
    pub event: DashEvent,
}
