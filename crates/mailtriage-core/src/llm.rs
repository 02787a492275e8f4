//! LLM caller — single-shot invocation of the Anthropic Messages API.
//!
//! The core never depends on model-specific behavior beyond getting text
//! back. `AnthropicCaller` talks to any Anthropic-compatible endpoint:
//!
//! POST {base_url}/v1/messages
//! Headers:
//!   x-api-key: {api_key}
//!   anthropic-version: 2023-06-01
//!   content-type: application/json

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Configuration for calling the LLM endpoint.
#[derive(Debug, Clone)]
pub struct LlmCallConfig {
    /// API base URL
    pub base_url: String,
    /// API key / auth token
    pub api_key: String,
    /// Model ID
    pub model: String,
    /// Maximum tokens for the response
    pub max_tokens: u32,
    /// Temperature
    pub temperature: Option<f64>,
}

impl LlmCallConfig {
    /// Build a configuration from the environment.
    ///
    /// Reads `ANTHROPIC_AUTH_TOKEN` / `ANTHROPIC_API_KEY` (required),
    /// `ANTHROPIC_BASE_URL`, and `ANTHROPIC_MODEL`.
    pub fn from_env() -> Result<Self, TriageError> {
        let api_key = std::env::var("ANTHROPIC_AUTH_TOKEN")
            .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            .unwrap_or_default();

        if api_key.is_empty() {
            return Err(TriageError::Config(
                "No API key found. Set ANTHROPIC_AUTH_TOKEN or ANTHROPIC_API_KEY".to_string(),
            ));
        }

        Ok(Self {
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            api_key,
            model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-7-sonnet-20250219".to_string()),
            max_tokens: 8192,
            temperature: None,
        })
    }
}

/// Response from an LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The model's text response
    pub content: String,
    /// Model that actually served the request
    pub model: String,
    /// Usage statistics
    pub usage: Option<UsageInfo>,
    /// Whether the call succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageInfo {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// The LLM execution seam. Object-safe so the executor can hold any caller.
#[async_trait]
pub trait LlmCaller: Send + Sync {
    async fn call(
        &self,
        config: &LlmCallConfig,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<LlmResponse, TriageError>;
}

/// Calls the Anthropic Messages API over HTTP.
pub struct AnthropicCaller {
    client: reqwest::Client,
}

impl AnthropicCaller {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for AnthropicCaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmCaller for AnthropicCaller {
    async fn call(
        &self,
        config: &LlmCallConfig,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<LlmResponse, TriageError> {
        let url = format!("{}/v1/messages", config.base_url.trim_end_matches('/'));

        let mut body = serde_json::json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": user_prompt
                }
            ]
        });

        if !system_prompt.is_empty() {
            body["system"] = serde_json::Value::String(system_prompt.to_string());
        }

        if let Some(temp) = config.temperature {
            body["temperature"] = serde_json::Value::Number(
                serde_json::Number::from_f64(temp).unwrap_or_else(|| serde_json::Number::from(0)),
            );
        }

        tracing::info!("[LlmCaller] Calling {} (model: {})", url, config.model);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TriageError::Llm(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| TriageError::Llm(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Ok(LlmResponse {
                content: String::new(),
                model: config.model.clone(),
                usage: None,
                success: false,
                error: Some(format!("API returned {}: {}", status, response_text)),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| TriageError::Llm(format!("failed to parse response JSON: {}", e)))?;

        Ok(parse_messages_response(&json, &config.model))
    }
}

/// Extract text content, model, and usage from an Anthropic Messages API
/// response body.
fn parse_messages_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    let content = json
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| {
            arr.iter()
                .filter_map(|block| {
                    if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                        block.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .reduce(|a, b| format!("{}\n{}", a, b))
        })
        .unwrap_or_default();

    let usage = json.get("usage").map(|u| UsageInfo {
        input_tokens: u.get("input_tokens").and_then(|v| v.as_u64()),
        output_tokens: u.get("output_tokens").and_then(|v| v.as_u64()),
    });

    let model = json
        .get("model")
        .and_then(|m| m.as_str())
        .unwrap_or(fallback_model)
        .to_string();

    LlmResponse {
        content,
        model,
        usage,
        success: true,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_blocks_and_usage() {
        let json = serde_json::json!({
            "model": "claude-3-7-sonnet-20250219",
            "content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "id": "x", "name": "t", "input": {}},
                {"type": "text", "text": "second"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        });
        let resp = parse_messages_response(&json, "fallback");
        assert_eq!(resp.content, "first\nsecond");
        assert_eq!(resp.model, "claude-3-7-sonnet-20250219");
        let usage = resp.usage.unwrap();
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(34));
        assert!(resp.success);
    }

    #[test]
    fn missing_fields_fall_back() {
        let json = serde_json::json!({"content": []});
        let resp = parse_messages_response(&json, "fallback-model");
        assert_eq!(resp.content, "");
        assert_eq!(resp.model, "fallback-model");
        assert!(resp.usage.is_none());
    }

    #[test]
    fn from_env_requires_api_key() {
        std::env::remove_var("ANTHROPIC_AUTH_TOKEN");
        std::env::remove_var("ANTHROPIC_API_KEY");
        assert!(LlmCallConfig::from_env().is_err());
    }
}
