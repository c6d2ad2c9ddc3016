//! Route optimiser backed by an OpenAI-compatible chat-completions API
//! (Groq by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::common::OptimizerError;
use crate::config::OptimizerConfig;
use crate::domains::agent::RouteUpdate;
use crate::domains::optimizer::{DisabledOptimizer, RouteOptimizer};

const SYSTEM_PROMPT: &str = "You are a traffic AI.";

pub struct GroqOptimizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl GroqOptimizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, OptimizerError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OptimizerError::NotConfigured);
        }

        let defaults = OptimizerConfig::default();
        Ok(Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: defaults.base_url,
            timeout: Duration::from_secs(defaults.timeout_secs),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        })
    }

    pub fn from_config(config: &OptimizerConfig) -> Result<Self, OptimizerError> {
        let api_key = config.api_key.clone().ok_or(OptimizerError::NotConfigured)?;
        Ok(Self::new(api_key, config.model.clone())?
            .with_base_url(config.base_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_sampling(config.temperature, config.max_tokens))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl RouteOptimizer for GroqOptimizer {
    async fn optimise(&self, routes: &[RouteUpdate]) -> Result<Vec<RouteUpdate>, OptimizerError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(routes)?,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model = %self.model, routes = routes.len(), "requesting route optimisation");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OptimizerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(OptimizerError::EmptyReply)?;

        parse_reply(&content)
    }
}

/// `GroqOptimizer` when an API key is configured, otherwise an optimiser
/// that always fails (and therefore leaves routes untouched).
pub fn build_optimizer(config: &OptimizerConfig) -> Arc<dyn RouteOptimizer> {
    match GroqOptimizer::from_config(config) {
        Ok(optimizer) => Arc::new(optimizer),
        Err(e) => {
            tracing::warn!("route optimiser disabled: {}", e);
            Arc::new(DisabledOptimizer)
        }
    }
}

pub fn build_prompt(routes: &[RouteUpdate]) -> Result<String, OptimizerError> {
    Ok(format!(
        "You are a traffic optimisation AI. Given the following planned routes for several \
         vehicles, detect congestion and propose alternate routes that minimise total travel \
         time. Reply with JSON only, shaped as {{\"routes\": [...]}} where each entry keeps the \
         same format as the input.\n\n{}",
        serde_json::to_string_pretty(routes)?
    ))
}

/// Decode the model's reply. A surrounding Markdown code fence is tolerated
/// and a missing `routes` key means "no revisions".
pub fn parse_reply(content: &str) -> Result<Vec<RouteUpdate>, OptimizerError> {
    let body = strip_code_fence(content);
    let reply: OptimizerReply =
        serde_json::from_str(body).map_err(|e| OptimizerError::MalformedReply(e.to_string()))?;
    Ok(reply.routes)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

#[derive(Debug, Deserialize)]
struct OptimizerReply {
    #[serde(default)]
    routes: Vec<RouteUpdate>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}
