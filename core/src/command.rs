use crate::{metrics::MetricField, types::Currency};
use serde::{Deserialize, Serialize};

/// Every mutation the presentation layer may issue.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DashCommand {
    // ── Metric inputs ─────────────────────────────
    SetMetric {
        field: MetricField,
        value: f64,
    },
    SetTierPrice {
        tier:  String,
        price: Currency,
    },

    // ── Session ───────────────────────────────────
    /// Discard all edits (equivalent to reloading the page).
    ResetMetrics,
}

impl DashCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            DashCommand::SetMetric { .. }    => "set_metric",
            DashCommand::SetTierPrice { .. } => "set_tier_price",
            DashCommand::ResetMetrics        => "reset_metrics",
        }
    }
}
