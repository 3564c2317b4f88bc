//! HTTP client for Claude API

use std::time::Duration;

use reqwest::Client;

use super::error::ClaudeError;
use super::models::{ClaudeModel, CreateMessageRequest, Message, MessageResponse};

/// Claude API client
#[derive(Clone)]
pub struct ClaudeClient {
    /// HTTP client
    client: Client,
    /// API key for authentication
    api_key: String,
}

impl ClaudeClient {
    /// Claude API base URL
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    /// API version header value
    const API_VERSION: &'static str = "2023-06-01";
    /// Upper bound for a single generation or grading call
    const TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new Claude client with the given API key
    pub fn new(api_key: String) -> Result<Self, ClaudeError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    /// Send a message request and return the complete response
    pub async fn send_message(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<MessageResponse, ClaudeError> {
        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ClaudeError::RateLimited { retry_after_seconds: retry_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClaudeError::ApiError {
                status: 401,
                message: "Invalid API key".to_string(),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClaudeError::ApiError { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        let message_response: MessageResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            id = %message_response.id,
            input_tokens = message_response.usage.input_tokens,
            output_tokens = message_response.usage.output_tokens,
            "claude response"
        );
        Ok(message_response)
    }

    /// Send a request and return its text, failing on an empty reply
    pub async fn complete(&self, request: &CreateMessageRequest) -> Result<String, ClaudeError> {
        let text = self.send_message(request).await?.text();
        let text = text.trim();
        if text.is_empty() {
            return Err(ClaudeError::EmptyResponse);
        }
        Ok(text.to_string())
    }

    /// Test the API key by sending a minimal request
    pub async fn test_connection(&self, model: ClaudeModel) -> Result<(), ClaudeError> {
        let request = CreateMessageRequest::new(model, vec![Message::user("Hi")])
            .with_max_tokens(10);

        self.send_message(&request).await?;
        Ok(())
    }
}
