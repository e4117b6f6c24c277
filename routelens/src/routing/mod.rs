//! Prompt routing.
//!
//! [`PromptRouter`] abstracts the routing library behind an async trait so
//! handlers and tests never talk to the network directly. [`RoutingGateway`]
//! wraps a router together with the measurement logic: latency, token
//! counts, cost, counterfactual cost, and provider label normalization.

pub mod routellm;

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    costs,
    errors::{Error, Result},
};

/// Router identifier used when none is configured. "mf" is the matrix
/// factorization router.
pub const DEFAULT_ROUTER_ID: &str = "mf";

/// Label recorded for calls served by the expensive reference model.
pub const REFERENCE_LABEL: &str = "GPT-4";
/// Label recorded for calls the router diverted to the cheap alternate model.
pub const ALTERNATE_LABEL: &str = "RouteLens";

/// Raw outcome of a routing call: the completion text and the identifier of
/// the model the routing library actually selected.
#[derive(Debug, Clone)]
pub struct RoutedCompletion {
    pub text: String,
    pub model: String,
}

/// A routing backend. Implementations decide which model serves the prompt
/// and return its completion.
#[async_trait]
pub trait PromptRouter: Send + Sync {
    async fn route(&self, prompt: &str, router_id: &str) -> anyhow::Result<RoutedCompletion>;
}

/// Fully measured outcome of routing one prompt.
#[derive(Debug, Clone)]
pub struct RoutedPrompt {
    pub response: String,
    /// Human-readable router label, e.g. "RouteLLM Router (MF)"
    pub model_used: String,
    /// Wall-clock latency in seconds
    pub latency: f64,
    /// USD cost at the selected model's rate
    pub cost: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Raw model identifier selected by the routing library
    pub selected_model: String,
    /// Normalized provider label for stored records and batch metrics
    pub provider_label: String,
    /// Counterfactual USD cost at the GPT-4 rate
    pub cost_gpt4: f64,
    /// Whether the raw selected model was the reference model
    pub is_reference: bool,
}

/// Shared routing entry point held in application state.
///
/// Router initialization happens once at startup and can fail. The failure
/// is captured here instead of aborting startup, so the rest of the service,
/// dashboard included, keeps working while routing endpoints report the
/// failure.
#[derive(Clone)]
pub struct RoutingGateway {
    router: std::result::Result<Arc<dyn PromptRouter>, String>,
    router_id: String,
}

impl std::fmt::Debug for RoutingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingGateway")
            .field("available", &self.router.is_ok())
            .field("router_id", &self.router_id)
            .finish()
    }
}

impl RoutingGateway {
    pub fn new(
        router: std::result::Result<Arc<dyn PromptRouter>, String>,
        router_id: impl Into<String>,
    ) -> Self {
        Self {
            router,
            router_id: router_id.into(),
        }
    }

    /// Whether router initialization succeeded.
    pub fn is_available(&self) -> bool {
        self.router.is_ok()
    }

    /// Initialization failure message, if any.
    pub fn init_error(&self) -> Option<&str> {
        self.router.as_ref().err().map(String::as_str)
    }

    /// Route one prompt and measure the call.
    ///
    /// Latency covers the full routing call. Token counts are derived from
    /// the prompt and completion text, and both the actual and the
    /// counterfactual GPT-4 cost are computed from them.
    #[instrument(skip(self, prompt), fields(router_id = %self.router_id))]
    pub async fn complete(&self, prompt: &str) -> Result<RoutedPrompt> {
        let router = self.router.as_ref().map_err(|_| Error::RouterUnavailable)?;

        let started = Instant::now();
        let completion = router
            .route(prompt, &self.router_id)
            .await
            .map_err(|e| Error::Router {
                message: format!("{e:#}"),
            })?;
        let latency = started.elapsed().as_secs_f64();

        let input_tokens = costs::token_count(prompt);
        let output_tokens = costs::token_count(&completion.text);

        let raw_model = completion.model.to_lowercase();
        let is_reference = raw_model.contains("gpt-4");
        // The gpt-3.5 check comes first: an identifier matching both
        // families is labeled alternate while still counting as reference.
        let provider_label = if raw_model.contains("gpt-3.5") {
            ALTERNATE_LABEL.to_string()
        } else if is_reference {
            REFERENCE_LABEL.to_string()
        } else {
            completion.model.clone()
        };

        Ok(RoutedPrompt {
            response: completion.text,
            model_used: format!("RouteLLM Router ({})", self.router_id.to_uppercase()),
            latency,
            cost: costs::cost(&completion.model, input_tokens, output_tokens),
            input_tokens,
            output_tokens,
            selected_model: completion.model,
            provider_label,
            cost_gpt4: costs::gpt4_equivalent_cost(input_tokens, output_tokens),
            is_reference,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::{test_support::gateway_with, *};

    #[tokio::test]
    async fn cheap_model_is_normalized_to_the_alternate_label() {
        let gateway = gateway_with("gpt-3.5-turbo", "Paris.");
        let outcome = gateway.complete("What is the capital of France?").await.unwrap();

        // The raw identifier survives alongside the normalized label.
        assert_eq!(outcome.selected_model, "gpt-3.5-turbo");
        assert_eq!(outcome.provider_label, ALTERNATE_LABEL);
        assert!(!outcome.is_reference);
        assert_eq!(outcome.model_used, "RouteLLM Router (MF)");
        assert_eq!(outcome.input_tokens, 30);
        assert_eq!(outcome.output_tokens, 6);
        assert!((outcome.cost - (30.0 * 2.5e-7 + 6.0 * 1.25e-6)).abs() < 1e-15);
        assert!((outcome.cost_gpt4 - (30.0 * 5e-6 + 6.0 * 1.5e-5)).abs() < 1e-15);
        assert!(outcome.latency >= 0.0);
    }

    #[tokio::test]
    async fn reference_model_is_flagged_and_costed_at_the_gpt4_rate() {
        let gateway = gateway_with("GPT-4-turbo", "Paris.");
        let outcome = gateway.complete("What is the capital of France?").await.unwrap();

        assert_eq!(outcome.selected_model, "GPT-4-turbo");
        assert_eq!(outcome.provider_label, REFERENCE_LABEL);
        assert!(outcome.is_reference);
        // For a reference call the actual and counterfactual costs coincide.
        assert_eq!(outcome.cost, outcome.cost_gpt4);
    }

    #[tokio::test]
    async fn identifier_matching_both_families_is_labeled_alternate() {
        let gateway = gateway_with("gpt-3.5-distilled-from-gpt-4", "Paris.");
        let outcome = gateway.complete("hi").await.unwrap();

        assert_eq!(outcome.provider_label, ALTERNATE_LABEL);
        // Reference detection only looks at the gpt-4 substring.
        assert!(outcome.is_reference);
        // Costing also prefers the gpt-4 match.
        assert_eq!(outcome.cost, outcome.cost_gpt4);
    }

    #[tokio::test]
    async fn unknown_model_keeps_its_raw_identifier() {
        let gateway = gateway_with("claude-3-haiku", "Paris.");
        let outcome = gateway.complete("hi").await.unwrap();

        assert_eq!(outcome.selected_model, "claude-3-haiku");
        assert_eq!(outcome.provider_label, "claude-3-haiku");
        assert!(!outcome.is_reference);
        assert_eq!(outcome.cost, 0.0);
    }

    #[tokio::test]
    async fn failed_initialization_surfaces_as_router_unavailable() {
        let gateway = RoutingGateway::new(
            Err("OPENAI_API_KEY is not configured".to_string()),
            DEFAULT_ROUTER_ID,
        );

        assert!(!gateway.is_available());
        assert_eq!(gateway.init_error(), Some("OPENAI_API_KEY is not configured"));
        let err = gateway.complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::RouterUnavailable));
    }

    #[tokio::test]
    async fn routing_failures_carry_the_backend_message() {
        struct FailingRouter;

        #[async_trait]
        impl PromptRouter for FailingRouter {
            async fn route(
                &self,
                _prompt: &str,
                _router_id: &str,
            ) -> anyhow::Result<RoutedCompletion> {
                anyhow::bail!("connection refused")
            }
        }

        let gateway = RoutingGateway::new(Ok(Arc::new(FailingRouter)), DEFAULT_ROUTER_ID);
        let err = gateway.complete("hi").await.unwrap_err();
        match err {
            Error::Router { message } => assert!(message.contains("connection refused")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
