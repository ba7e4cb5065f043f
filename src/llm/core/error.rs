//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when using LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Rejected credentials
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// SSE stream failures
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Provider-specific errors
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

impl LlmError {
    /// Classify a non-success HTTP response from the provider
    pub fn from_status(status: u16, retry_after: Option<Duration>, body: String) -> Self {
        match status {
            401 | 403 => LlmError::AuthenticationError(body),
            429 => LlmError::RateLimitExceeded { retry_after },
            400 | 404 | 422 => LlmError::InvalidRequest(body),
            _ => LlmError::HttpError { status, body },
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = LlmError::HttpError {
            status: 502,
            body: "Bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            LlmError::from_status(401, None, "bad key".to_string()),
            LlmError::AuthenticationError(_)
        ));
        assert!(matches!(
            LlmError::from_status(429, Some(Duration::from_secs(20)), String::new()),
            LlmError::RateLimitExceeded {
                retry_after: Some(d)
            } if d == Duration::from_secs(20)
        ));
        assert!(matches!(
            LlmError::from_status(400, None, "bad model".to_string()),
            LlmError::InvalidRequest(_)
        ));
        assert!(matches!(
            LlmError::from_status(503, None, "overloaded".to_string()),
            LlmError::HttpError { status: 503, .. }
        ));
    }

    #[test]
    fn test_provider_error_display() {
        let err = LlmError::ProviderError {
            code: "invalid_api_key".to_string(),
            message: "API key is invalid".to_string(),
        };
        assert!(err.to_string().contains("invalid_api_key"));
        assert!(err.to_string().contains("API key is invalid"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::SerializationError(_)));
    }
}
