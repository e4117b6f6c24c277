//! HTTP handlers for prompt routing, batch processing, and historical seeding.

use axum::{Json, extract::State};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, instrument};

use crate::{
    AppState,
    api::models::{
        BatchMetricsResponse, MessageResponse, PromptRequest, QuestionMetrics, QuestionsRequest,
        RouteLlmResponse,
    },
    db::{errors::DbError, handlers::CallRecords, models::call_records::CallRecordCreateDBRequest},
    errors::Result,
    routing::RoutedPrompt,
};

/// Sample question set used to seed historical dashboard data. A mix of
/// simple factual questions (which a router should divert to the cheap
/// model) and harder reasoning prompts.
const SAMPLE_QUESTIONS: [&str; 10] = [
    "What is the capital of France?",
    "Explain the process of photosynthesis.",
    "What is Bernoulli's Principle?",
    "How does entropy relate to the Second Law of Thermodynamics? ",
    "Explain how a transistor works in a circuit.",
    "Why do superconductors work at extremely low temperatures?",
    "How does quantum entanglement defy classical physics?",
    "What is the Trolley Problem in ethics?",
    "How does Kant's categorical imperative differ from utilitarianism?",
    "What are the philosophical implications of AI consciousness?",
];

fn db_request(
    question: &str,
    outcome: &RoutedPrompt,
    timestamp: DateTime<Utc>,
) -> CallRecordCreateDBRequest {
    CallRecordCreateDBRequest {
        question: question.to_string(),
        selected_model: outcome.provider_label.clone(),
        latency: outcome.latency,
        cost: outcome.cost,
        input_tokens: outcome.input_tokens,
        output_tokens: outcome.output_tokens,
        cost_gpt4: outcome.cost_gpt4,
        timestamp,
        is_reference: outcome.is_reference,
    }
}

#[utoipa::path(
    post,
    path = "/process_prompt",
    tag = "prompts",
    summary = "Route a single prompt",
    description = "Routes one prompt through the configured router and returns the completion \
                   together with latency, token counts, and cost. The call is not persisted.",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Prompt routed successfully", body = RouteLlmResponse),
        (status = 500, description = "Router not initialized, or the routing call failed"),
    )
)]
#[instrument(skip_all)]
pub async fn process_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<RouteLlmResponse>> {
    info!("Processing prompt: {:.50}...", request.prompt);

    let outcome = state.gateway.complete(&request.prompt).await?;
    info!(
        "Prompt processed - Model: {} - Cost: ${:.4}",
        outcome.model_used, outcome.cost
    );

    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/process_50_questions",
    tag = "prompts",
    summary = "Route a batch of questions",
    description = "Routes each question sequentially, persisting one call record per question as \
                   it completes. A failure part-way through aborts the batch; records for \
                   already-processed questions are kept.",
    request_body = QuestionsRequest,
    responses(
        (status = 200, description = "All questions processed", body = BatchMetricsResponse),
        (status = 500, description = "Router not initialized, or a routing/database call failed"),
    )
)]
#[instrument(skip_all, fields(questions = request.questions.len()))]
pub async fn process_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<BatchMetricsResponse>> {
    let total = request.questions.len();
    debug!("Starting processing of {total} questions");

    let mut metrics = Vec::with_capacity(total);
    for (i, question) in request.questions.iter().enumerate() {
        debug!("Processing question {}/{}: {:.50}...", i + 1, total, question);
        let outcome = state.gateway.complete(question).await?;

        // Each record commits on its own, so a failure later in the batch
        // never discards completed work.
        let mut tx = state.db.begin().await.map_err(DbError::from)?;
        CallRecords::new(&mut tx)
            .create(&db_request(question, &outcome, Utc::now()))
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        debug!(
            "Question {} processed. Model: {}, Cost: ${:.4}",
            i + 1,
            outcome.provider_label,
            outcome.cost
        );

        metrics.push(QuestionMetrics {
            question: question.clone(),
            selected_model: outcome.provider_label,
            latency: outcome.latency,
            cost: outcome.cost,
            input_tokens: outcome.input_tokens,
            output_tokens: outcome.output_tokens,
            cost_gpt4: outcome.cost_gpt4,
        });
    }

    info!("Processing completed: {total} questions");

    Ok(Json(BatchMetricsResponse { metrics }))
}

#[utoipa::path(
    post,
    path = "/populate_historical_data",
    tag = "prompts",
    summary = "Seed historical dashboard data",
    description = "Routes a fixed sample question set and stores the results dated across a \
                   fixed historical date range. Each day commits as one transaction.",
    responses(
        (status = 200, description = "Historical data populated", body = MessageResponse),
        (status = 500, description = "Router not initialized, or a routing/database call failed"),
    )
)]
#[instrument(skip_all)]
pub async fn populate_historical_data(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>> {
    // Fixed demo range. Both bounds are inclusive.
    let start_date = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
    let end_date = start_date;

    let mut current_date = start_date;
    while current_date <= end_date {
        let timestamp = current_date.and_hms_opt(0, 0, 0).unwrap().and_utc();

        let mut tx = state.db.begin().await.map_err(DbError::from)?;
        for question in SAMPLE_QUESTIONS {
            let outcome = state.gateway.complete(question).await?;
            CallRecords::new(&mut tx)
                .create(&db_request(question, &outcome, timestamp))
                .await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        current_date += Duration::days(1);
    }

    Ok(Json(MessageResponse {
        message: "Historical data population complete.".to_string(),
    }))
}
