//! Chat-completion client for the external text-generation service.
//!
//! The wire contract is the OpenAI-format `/v1/chat/completions` endpoint.
//! Everything that can go wrong upstream - transport errors, timeouts,
//! non-2xx statuses, unreadable bodies - collapses into
//! [`LlmError::Unavailable`]; callers fall back to their deterministic
//! strategy instead of retrying.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use coursey_core::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm service unavailable: {0}")]
    Unavailable(String),
}

/// One completion request. Temperature and output budget are fixed by the
/// call site (extraction wants stable JSON, narration wants prose).
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub json_output: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

pub struct ChatCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl ChatCompletionClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Unavailable("llm api key is not configured".to_owned()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Unavailable(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| LlmError::Unavailable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Unavailable(format!("upstream returned status {status}")));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| LlmError::Unavailable(format!("unreadable completion body: {error}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Unavailable("empty completion".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use coursey_core::config::LlmConfig;

    use super::{ChatCompletionClient, LlmError};

    #[test]
    fn client_requires_an_api_key() {
        let config = LlmConfig {
            enabled: true,
            api_key: None,
            base_url: "https://api.deepseek.com".to_owned(),
            model: "deepseek-chat".to_owned(),
            timeout_secs: 5,
        };

        let result = ChatCompletionClient::from_config(&config);
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = LlmConfig {
            enabled: true,
            api_key: Some("sk-test".to_owned().into()),
            base_url: "https://api.deepseek.com/".to_owned(),
            model: "deepseek-chat".to_owned(),
            timeout_secs: 5,
        };

        let client = ChatCompletionClient::from_config(&config).expect("client");
        assert_eq!(client.base_url, "https://api.deepseek.com");
    }
}
