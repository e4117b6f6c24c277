//! Row models for the `call_records` table.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One persisted row capturing a single routed prompt's outcome and cost.
///
/// Rows are append-only: created exactly once after a routing call completes,
/// never updated, never deleted. No retention policy is applied - the table
/// grows unbounded, which is acceptable for the demo-scale dataset this
/// service records.
#[derive(Debug, Clone, FromRow)]
pub struct CallRecord {
    pub id: i64,
    pub question: String,
    /// Normalized provider label, not the raw model identifier.
    pub selected_model: String,
    /// Wall-clock routing latency in seconds.
    pub latency: f64,
    /// USD actually charged for this call.
    pub cost: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Counterfactual USD cost at the GPT-4 rate, whatever model served it.
    pub cost_gpt4: f64,
    pub timestamp: DateTime<Utc>,
    /// Derived from `timestamp` at insertion time; never updated on its own.
    pub month: i64,
    pub year: i64,
    /// True iff the raw (pre-normalization) model identifier contained "gpt-4".
    pub is_reference: bool,
}

/// Insertion request for a call record. `month` and `year` are intentionally
/// absent: the repository derives them from `timestamp` so the denormalized
/// columns can never drift.
#[derive(Debug, Clone)]
pub struct CallRecordCreateDBRequest {
    pub question: String,
    pub selected_model: String,
    pub latency: f64,
    pub cost: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_gpt4: f64,
    pub timestamp: DateTime<Utc>,
    pub is_reference: bool,
}
