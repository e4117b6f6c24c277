//! # routelens: LLM Routing Cost Analytics
//!
//! `routelens` is a backend service for measuring what an LLM router saves you.
//! It forwards prompts to a [RouteLLM](https://github.com/lm-sys/RouteLLM)
//! endpoint, which decides per prompt whether the expensive reference model
//! (GPT-4) or a cheap alternate model should answer. Every routed call is
//! recorded with its latency, token counts, actual cost, and the
//! counterfactual cost of answering with GPT-4, and the service aggregates
//! those records into a dashboard summary of savings over time.
//!
//! ## Request Flow
//!
//! A prompt posted to `/process_prompt` goes through the [`routing`] gateway,
//! which measures the call and normalizes the selected model into a provider
//! label. Batch processing via `/process_50_questions` does the same per
//! question and persists one call record per question as it completes.
//! `/dashboard_data` recomputes the full summary from the store on every
//! request.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLite via SQLx for persistence. The **API layer**
//! ([`api`]) holds handlers and wire models, the **database layer** ([`db`])
//! uses the repository pattern over the `call_records` table, and the
//! **routing layer** ([`routing`]) abstracts the RouteLLM backend behind a
//! trait so it can be stubbed in tests.
//!
//! Router initialization happens at startup and is allowed to fail: the
//! service keeps serving the dashboard while routing endpoints report the
//! initialization failure.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use routelens::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = routelens::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     routelens::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod costs;
pub mod db;
pub mod errors;
mod openapi;
pub mod routing;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use openapi::ApiDoc;
use routing::{PromptRouter, RoutingGateway, routellm::RouteLlmClient};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .gateway(gateway)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub gateway: RoutingGateway,
}

/// Get the routelens database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    db::migrator()
}

/// Construct the routing gateway from configuration.
///
/// Configuration validation requires the API key, so the error state here
/// only arises for a gateway built from an unvalidated config. Either way
/// the failure is captured in the gateway and surfaced when a routing
/// endpoint is hit.
pub fn build_gateway(config: &Config) -> RoutingGateway {
    let router: Result<Arc<dyn PromptRouter>, String> = match &config.router.api_key {
        Some(key) => Ok(Arc::new(RouteLlmClient::new(
            config.router.base_url.clone(),
            key.clone(),
        ))),
        None => Err("OPENAI_API_KEY is not configured".to_string()),
    };

    RoutingGateway::new(router, config.router.router_id.clone())
}

/// Build the main application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/process_prompt", post(api::handlers::prompts::process_prompt))
        .route(
            "/process_50_questions",
            post(api::handlers::prompts::process_questions),
        )
        .route(
            "/populate_historical_data",
            post(api::handlers::prompts::populate_historical_data),
        )
        .route("/dashboard_data", get(api::handlers::dashboard::get_dashboard_data))
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        // The dashboard frontend is served from a different origin.
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and initializes the routing gateway
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests
///    drain and the pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting routelens with configuration: {:#?}", config);

        let pool = db::connect(&config.database_url).await?;

        let gateway = build_gateway(&config);
        match gateway.init_error() {
            None => info!(
                "Router initialized (router_id: {})",
                config.router.router_id
            ),
            Some(reason) => warn!(
                "Router initialization failed, routing endpoints unavailable: {reason}"
            ),
        }

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .gateway(gateway)
            .build();

        let router = build_router(&state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "RouteLens listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );
        info!("Endpoints available:");
        info!("  POST /process_prompt");
        info!("  POST /process_50_questions");
        info!("  GET  /dashboard_data");
        info!("  POST /populate_historical_data");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::routing::test_support::gateway_with;
    use crate::test_utils::create_test_app;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn healthz_responds_ok(pool: SqlitePool) {
        let app = create_test_app(pool, gateway_with("gpt-3.5-turbo", "ok")).await;

        let response = app.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[test]
    fn gateway_without_api_key_is_unavailable() {
        let config = Config::default();
        let gateway = build_gateway(&config);
        assert!(!gateway.is_available());
        assert_eq!(gateway.init_error(), Some("OPENAI_API_KEY is not configured"));
    }

    #[test]
    fn gateway_with_api_key_is_available() {
        let mut config = Config::default();
        config.router.api_key = Some("sk-test".to_string());
        let gateway = build_gateway(&config);
        assert!(gateway.is_available());
    }
}
