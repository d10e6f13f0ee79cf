//! Anthropic Messages API client.

use super::RemoteDispatch;
use crate::config::RemoteConfig;
use crate::error::{Result, TagsmithError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

/// Blocking client for the Messages endpoint configured under `remote:`.
#[derive(Debug, Clone)]
pub struct AnthropicDispatch {
    config: RemoteConfig,
}

impl AnthropicDispatch {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            TagsmithError::DispatchError(format!(
                "{} environment variable not set",
                self.config.api_key_env
            ))
        })
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "model": &self.config.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}]
        })
    }
}

impl RemoteDispatch for AnthropicDispatch {
    fn send(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self.api_key()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| {
                TagsmithError::DispatchError(format!("failed to build HTTP client: {}", e))
            })?;

        debug!(model = %self.config.model, max_tokens, chars = prompt.len(), "sending prompt");
        let response = client
            .post(&self.config.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.request_body(prompt, max_tokens))
            .send()
            .map_err(|e| TagsmithError::DispatchError(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(TagsmithError::DispatchError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let api_response: ApiResponse = response.json().map_err(|e| {
            TagsmithError::DispatchError(format!("failed to decode response: {}", e))
        })?;

        let text: String = api_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(TagsmithError::DispatchError(
                "empty response from model".to_string(),
            ));
        }

        info!(model = %self.config.model, chars = text.len(), "received response");
        Ok(text)
    }
}
