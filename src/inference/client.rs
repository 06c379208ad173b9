//! OpenAI-compatible inference client.
//!
//! Sends non-streaming chat completion requests to the hosted tool-calling
//! model. Transient failures are retried with exponential backoff; everything
//! else is returned to the orchestrator as an [`InferenceError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::errors::InferenceError;
use super::response::parse_completion_response;
use super::types::{ChatCompletionRequest, ChatMessage, ModelReply, SamplingOverrides, ToolDefinition};
use crate::config::ModelConfig;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum retry attempts for transient errors.
const MAX_RETRIES: u32 = 2;

/// Base delay between retries (doubles each attempt).
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

// ─── ModelService ────────────────────────────────────────────────────────────

/// The two-call request/response contract the orchestrator depends on.
///
/// Implemented by [`InferenceClient`] against a live endpoint and by scripted
/// fakes in tests.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        sampling: SamplingOverrides,
    ) -> Result<ModelReply, InferenceError>;
}

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for the model's `/chat/completions` endpoint.
pub struct InferenceClient {
    http: HttpClient,
    base_url: String,
    model_name: String,
    api_key: String,
    timeout_secs: u64,
}

impl InferenceClient {
    /// Create a client from the model configuration.
    ///
    /// Does NOT check connectivity; that happens on the first request.
    pub fn from_config(config: &ModelConfig) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_request(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        sampling: SamplingOverrides,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model_name.clone(),
            messages,
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            max_tokens: sampling.max_tokens,
            stream: false,
        }
    }

    /// Send one chat completion request, retrying transient failures.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        sampling: SamplingOverrides,
    ) -> Result<ModelReply, InferenceError> {
        let body = self.build_request(messages, tools, sampling);

        // Log the request metadata (not the full body; it can be huge)
        tracing::info!(
            url = %self.completions_url(),
            model = %body.model,
            message_count = body.messages.len(),
            has_tools = body.tools.is_some(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            temperature = body.temperature,
            max_tokens = body.max_tokens,
            "=== LLM REQUEST ==="
        );

        let mut attempt = 0;
        loop {
            match self.try_request(&body).await {
                Ok(reply) => {
                    tracing::info!(
                        tool_calls = reply.tool_calls.len(),
                        text_len = reply.text.as_ref().map(|t| t.len()).unwrap_or(0),
                        finish_reason = reply.finish_reason.as_deref().unwrap_or("none"),
                        "=== LLM RESPONSE ==="
                    );
                    return Ok(reply);
                }
                Err(e) if e.is_retriable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying model request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Attempt a single request.
    async fn try_request(&self, body: &ChatCompletionRequest) -> Result<ModelReply, InferenceError> {
        let url = self.completions_url();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        duration_secs: self.timeout_secs,
                    }
                } else {
                    InferenceError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| InferenceError::ResponseParse {
            reason: format!("failed to read response body: {e}"),
        })?;

        parse_completion_response(&body_text)
    }
}

#[async_trait]
impl ModelService for InferenceClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        sampling: SamplingOverrides,
    ) -> Result<ModelReply, InferenceError> {
        self.chat_completion(messages, tools, sampling).await
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassSampling;
    use crate::inference::types::ToolDefinition;
    use serde_json::json;

    fn test_config() -> ModelConfig {
        ModelConfig {
            base_url: "http://localhost:11111/v1/".to_string(),
            model_name: "gemini-2.0-flash".to_string(),
            api_key: "test-key".to_string(),
            first_pass: PassSampling {
                temperature: 1.0,
                max_tokens: 2000,
            },
            second_pass: PassSampling {
                temperature: 0.7,
                max_tokens: 1000,
            },
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let client = InferenceClient::from_config(&test_config()).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:11111/v1/chat/completions");
        assert_eq!(client.model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn test_tool_choice_set_only_with_tools() {
        let client = InferenceClient::from_config(&test_config()).unwrap();
        let sampling = SamplingOverrides::from(test_config().first_pass);

        let with_tools = client.build_request(
            vec![ChatMessage::user("hi")],
            Some(vec![ToolDefinition::function("get_jobs", "List jobs", json!({"type": "object"}))]),
            sampling,
        );
        assert_eq!(with_tools.tool_choice.as_deref(), Some("auto"));
        assert_eq!(with_tools.max_tokens, 2000);
        assert!(!with_tools.stream);

        let without = client.build_request(vec![ChatMessage::user("hi")], None, sampling);
        assert!(without.tool_choice.is_none());
        assert!(without.tools.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let mut config = test_config();
        // Port 9 (discard) on localhost is closed in test environments.
        config.base_url = "http://127.0.0.1:9/v1".into();
        let client = InferenceClient {
            http: HttpClient::builder()
                .connect_timeout(Duration::from_millis(200))
                .build()
                .unwrap(),
            base_url: config.base_url.clone(),
            model_name: config.model_name.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: 1,
        };
        let body = client.build_request(
            vec![ChatMessage::user("hi")],
            None,
            SamplingOverrides::from(config.second_pass),
        );
        let err = client.try_request(&body).await.unwrap_err();
        assert!(err.is_retriable());
    }
}
