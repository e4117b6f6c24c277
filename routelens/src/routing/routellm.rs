//! RouteLLM-backed router.
//!
//! Talks to an OpenAI-compatible chat completions endpoint where the model
//! field selects a RouteLLM router and calibration threshold instead of a
//! concrete model. The response reports which underlying model the router
//! actually dispatched to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{PromptRouter, RoutedCompletion};

/// Calibrated routing threshold. Chosen so roughly half the calibration
/// traffic lands on the reference model.
pub const ROUTER_THRESHOLD: f64 = 0.11593;

#[derive(Debug, Clone)]
pub struct RouteLlmClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    threshold: f64,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl RouteLlmClient {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            threshold: ROUTER_THRESHOLD,
        }
    }

    /// The model string understood by the RouteLLM endpoint, e.g.
    /// `router-mf-0.11593`.
    fn model_string(&self, router_id: &str) -> String {
        format!("router-{router_id}-{}", self.threshold)
    }
}

#[async_trait]
impl PromptRouter for RouteLlmClient {
    async fn route(&self, prompt: &str, router_id: &str) -> anyhow::Result<RoutedCompletion> {
        let url = self.base_url.join("chat/completions")?;
        let body = ChatCompletionRequest {
            model: self.model_string(router_id),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatCompletionResponse>()
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("chat completion response contained no choices"))?;

        Ok(RoutedCompletion {
            text: choice.message.content,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_string_encodes_router_and_threshold() {
        let client = RouteLlmClient::new(
            Url::parse("https://router.example.com/v1/").unwrap(),
            "sk-test".to_string(),
        );
        assert_eq!(client.model_string("mf"), "router-mf-0.11593");
    }
}
