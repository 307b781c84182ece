//! Chat Completions client for the production gateway.
//!
//! Each attempt is bounded by the configured timeout. Timeouts, connection
//! failures, 429 and 5xx responses are retried up to `max_retries` times;
//! everything else fails immediately, including a 429 reporting
//! `insufficient_quota`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::OpenAiConfig;

use super::error::{ApiErrorResponse, GatewayError};
use super::types::{ChatMessage, ChatRequest, ChatResponse, JsonSchemaFormat, ResponseFormat};
use super::{ModelGateway, OutputSchema};

const RETRY_BACKOFF: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);
const INSUFFICIENT_QUOTA: &str = "insufficient_quota";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Completion API client.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| GatewayError::InvalidConfig("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                endpoint: config.completions_url(),
                model: config.model.clone(),
                temperature: config.temperature,
                max_retries: config.max_retries,
            }),
        })
    }

    fn request(&self, prompt: &str, response_format: Option<ResponseFormat>) -> ChatRequest {
        ChatRequest {
            model: self.inner.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.inner.temperature,
            response_format,
        }
    }

    /// Send a request, retrying retryable failures.
    async fn send(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.inner.max_retries => {
                    attempt += 1;
                    let delay = e.retry_after().unwrap_or(RETRY_BACKOFF).min(MAX_RETRY_DELAY);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Completion request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Parse(format!("Failed to parse response: {e}")))?;
        if let Some(usage) = parsed.usage {
            tracing::debug!(
                model = %parsed.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }
        extract_text(parsed)
    }

    /// Map an error status code to a gateway error.
    async fn error_from_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GatewayError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            let quota = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<ApiErrorResponse>(&body).ok())
                .filter(|api_error| api_error.error.code.as_deref() == Some(INSUFFICIENT_QUOTA));
            return match quota {
                Some(api_error) => GatewayError::QuotaExceeded(api_error.error.message),
                None => GatewayError::RateLimited(retry_after),
            };
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return GatewayError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => GatewayError::Api {
                    status: status.as_u16(),
                    error_type: api_error
                        .error
                        .error_type
                        .or(api_error.error.code)
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: api_error.error.message,
                },
                Err(_) => GatewayError::Api {
                    status: status.as_u16(),
                    error_type: "unknown".to_string(),
                    message: body,
                },
            },
            Err(e) => GatewayError::Http(e),
        }
    }
}

/// Pull the text of the first choice out of a response.
fn extract_text(response: ChatResponse) -> Result<String, GatewayError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or(GatewayError::EmptyCompletion)?
        .message;

    match (message.content, message.refusal) {
        (Some(content), _) if !content.is_empty() => Ok(content),
        (_, Some(refusal)) => Err(GatewayError::Refused(refusal)),
        _ => Err(GatewayError::EmptyCompletion),
    }
}

#[async_trait]
impl ModelGateway for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.inner.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = self.request(prompt, None);
        self.send(&request).await
    }

    #[instrument(
        skip(self, prompt, schema),
        fields(model = %self.inner.model, prompt_len = prompt.len(), schema = %schema.name)
    )]
    async fn complete_json(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, GatewayError> {
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: schema.name.clone(),
                schema: schema.schema.clone(),
            },
        };
        let request = self.request(prompt, Some(format));
        self.send(&request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::types::{AssistantMessage, Choice};

    fn response_with(content: Option<&str>, refusal: Option<&str>) -> ChatResponse {
        ChatResponse {
            id: "chatcmpl-1".to_string(),
            model: "gpt-4o-mini".to_string(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content: content.map(String::from),
                    refusal: refusal.map(String::from),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    #[test]
    fn test_extract_text_returns_first_choice() {
        let text = extract_text(response_with(Some("{\"cart\":[]}"), None)).expect("text");
        assert_eq!(text, "{\"cart\":[]}");
    }

    #[test]
    fn test_extract_text_refusal() {
        let err = extract_text(response_with(None, Some("I can't help with that"))).unwrap_err();
        assert!(matches!(err, GatewayError::Refused(ref msg) if msg == "I can't help with that"));
    }

    #[test]
    fn test_extract_text_empty() {
        let err = extract_text(response_with(Some(""), None)).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyCompletion));

        let mut response = response_with(None, None);
        response.choices.clear();
        assert!(matches!(
            extract_text(response).unwrap_err(),
            GatewayError::EmptyCompletion
        ));
    }

    #[test]
    fn test_openai_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<OpenAiClient>();
    }
}
