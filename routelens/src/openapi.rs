//! OpenAPI/Swagger documentation configuration.
//!
//! The generated spec is served at `/docs` via Scalar when the server is
//! running.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RouteLens",
        description = "LLM routing cost analytics: routes prompts through RouteLLM, records \
                       per-call cost and latency metrics, and serves aggregated dashboard \
                       summaries."
    ),
    paths(
        api::handlers::prompts::process_prompt,
        api::handlers::prompts::process_questions,
        api::handlers::prompts::populate_historical_data,
        api::handlers::dashboard::get_dashboard_data,
    ),
    components(schemas(
        api::models::PromptRequest,
        api::models::RouteLlmResponse,
        api::models::QuestionsRequest,
        api::models::QuestionMetrics,
        api::models::BatchMetricsResponse,
        api::models::MessageResponse,
        api::models::DashboardResponse,
        api::models::MonthlyImpact,
        api::models::DailyCostEntry,
        api::models::DailyCallEntry,
    )),
    tags(
        (name = "prompts", description = "Prompt routing and batch processing"),
        (name = "dashboard", description = "Aggregated cost analytics"),
    )
)]
pub struct ApiDoc;
