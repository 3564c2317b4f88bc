//! Error types for Claude API integration

use thiserror::Error;

/// Errors that can occur when interacting with the Claude API
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// API key is not configured
    #[error("API key not configured. Run `lector key <KEY>` or set ANTHROPIC_API_KEY")]
    ApiKeyNotFound,

    /// Failed to access system keyring
    #[error("Failed to access keyring: {0}")]
    KeyringError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Rate limited by the API
    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after_seconds: u64,
    },

    /// Response had no text content
    #[error("Empty response from Claude")]
    EmptyResponse,

    /// Invalid API key format
    #[error("Invalid API key format. Key should start with 'sk-ant-'")]
    InvalidApiKey,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClaudeError {
    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClaudeError::RateLimited { .. }
                | ClaudeError::RequestError(_)
                | ClaudeError::EmptyResponse
                | ClaudeError::ApiError { status: 500.., .. }
        )
    }

    /// Check if this error requires re-authentication
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            ClaudeError::ApiKeyNotFound
                | ClaudeError::InvalidApiKey
                | ClaudeError::ApiError { status: 401, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_recoverable() {
        assert!(ClaudeError::ApiError { status: 529, message: "overloaded".into() }.is_recoverable());
        assert!(!ClaudeError::ApiError { status: 400, message: "bad".into() }.is_recoverable());
        assert!(ClaudeError::RateLimited { retry_after_seconds: 5 }.is_recoverable());
    }

    #[test]
    fn unauthorized_requires_reauth() {
        assert!(ClaudeError::ApiError { status: 401, message: String::new() }.requires_reauth());
        assert!(ClaudeError::ApiKeyNotFound.requires_reauth());
        assert!(!ClaudeError::EmptyResponse.requires_reauth());
    }
}
