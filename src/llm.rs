//! Language-model client abstraction.
//!
//! [`Assistant`] is the seam between the ask pipeline and the hosted model.
//! [`OpenAIChat`] implements it with the OpenAI chat completions API:
//!
//! ```text
//! POST {base_url}/chat/completions
//! { "model": "...", "messages": [{"role": "user", "content": prompt}], "temperature": 0.7 }
//! ```
//!
//! There is no retry: a failed call fails the request with an upstream
//! error carrying the API's diagnostic.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::OpenAIConfig;
use crate::error::{SynapsisError, SynapsisResult};

/// Something that answers a prompt.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    async fn ask(&self, prompt: &str) -> SynapsisResult<String>;
}

pub struct OpenAIChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl OpenAIChat {
    pub fn new(config: &OpenAIConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    /// Build from config, reading the API key from the environment.
    pub fn from_env(config: &OpenAIConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl Assistant for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn ask(&self, prompt: &str) -> SynapsisResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SynapsisError::upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SynapsisError::upstream(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SynapsisError::upstream(format!("invalid response body: {}", e)))?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> SynapsisResult<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| SynapsisError::upstream("Invalid OpenAI response: missing message content"))
}
