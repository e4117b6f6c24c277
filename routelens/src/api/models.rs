//! API request/response models.
//!
//! Kept separate from the database row models in [`crate::db::models`] so the
//! wire format and the storage schema can evolve independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::routing::RoutedPrompt;

// Request models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptRequest {
    /// The prompt to route
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionsRequest {
    /// Ordered list of questions, processed sequentially
    pub questions: Vec<String>,
}

// Response models

/// Outcome of routing a single prompt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RouteLlmResponse {
    /// Response text from the model that served the call
    pub response: String,
    /// Human-readable label for the router that handled the prompt
    pub model_used: String,
    /// Wall-clock latency in seconds
    pub latency: f64,
    /// USD cost of the call
    pub cost: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Raw model identifier selected by the routing library
    pub selected_model: String,
}

impl From<RoutedPrompt> for RouteLlmResponse {
    fn from(outcome: RoutedPrompt) -> Self {
        Self {
            response: outcome.response,
            model_used: outcome.model_used,
            latency: outcome.latency,
            cost: outcome.cost,
            input_tokens: outcome.input_tokens,
            output_tokens: outcome.output_tokens,
            selected_model: outcome.selected_model,
        }
    }
}

/// Per-question metrics entry returned by the batch endpoint. The field names
/// are part of the wire contract consumed by the dashboard frontend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionMetrics {
    #[serde(rename = "Question")]
    pub question: String,
    /// Normalized provider label, not the raw identifier
    #[serde(rename = "Selected Model")]
    pub selected_model: String,
    #[serde(rename = "Latency (s)")]
    pub latency: f64,
    #[serde(rename = "Cost ($)")]
    pub cost: f64,
    #[serde(rename = "Input Tokens")]
    pub input_tokens: i64,
    #[serde(rename = "Output Tokens")]
    pub output_tokens: i64,
    /// Counterfactual GPT-4 cost for the same token counts
    #[serde(rename = "Cost_GPT4 ($)")]
    pub cost_gpt4: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchMetricsResponse {
    pub metrics: Vec<QuestionMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// One calendar month of the cost-optimization comparison. Unlike the flat
/// month number alone, carrying the year keeps entries unambiguous across a
/// year boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyImpact {
    /// Calendar month, 1-12
    pub month: u32,
    pub year: i32,
    /// What the month would have cost at the GPT-4 rate
    pub potential_cost: f64,
    /// What the month actually cost
    pub actual_cost: f64,
}

/// Per-day cost split between the reference and alternate providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyCostEntry {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub reference_cost: f64,
    pub alternate_cost: f64,
}

/// Per-day call-count split between the reference and alternate providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyCallEntry {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub reference_calls: i64,
    pub alternate_calls: i64,
}

/// Full dashboard summary. Derived, never persisted: every field is
/// recomputed from the call-record table on each request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    /// Counterfactual total minus actual total across all records
    pub total_savings: f64,
    pub total_api_calls: i64,
    pub reference_api_calls: i64,
    pub alternate_api_calls: i64,
    pub total_cost: f64,
    pub reference_cost: f64,
    pub alternate_cost: f64,
    /// Counterfactual total at the GPT-4 rate
    pub total_cost_gpt4: f64,
    /// The 5 most recent calendar months, most recent first
    pub cost_optimization_impact: Vec<MonthlyImpact>,
    /// The 15 most recent calendar days including today, most recent first
    pub daily_cost_breakdown: Vec<DailyCostEntry>,
    /// Same window as `daily_cost_breakdown`, call counts instead of cost
    pub daily_call_comparison: Vec<DailyCallEntry>,
    /// Percentage splits; exactly 0 when the corresponding total is 0
    pub call_percentage_reference: f64,
    pub call_percentage_alternate: f64,
    pub cost_percentage_reference: f64,
    pub cost_percentage_alternate: f64,
    pub total_tokens: i64,
    pub reference_tokens: i64,
    pub alternate_tokens: i64,
}
