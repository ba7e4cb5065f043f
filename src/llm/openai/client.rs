//! Chat completions client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{Completion, GenerateRequest, StreamEvent},
};

use super::mapper::{from_openai_frame, from_openai_response, to_openai_request, StreamState};
use super::sse::parse_sse_stream;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, OpenAiErrorEnvelope};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer credential, never logged
    api_key: SecretString,
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Whole-request timeout for blocking completions
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a configuration with the default endpoint and model
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the `/chat/completions` endpoint
pub struct OpenAiClient {
    http_client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Post a request body, mapping non-2xx statuses to errors
    ///
    /// Streaming requests pass no timeout: a long reply must not be cut off
    /// while fragments are still arriving.
    async fn send(
        &self,
        body: &ChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Response, LlmError> {
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream,
            "sending chat completion request"
        );

        let mut builder = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<OpenAiErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    };

    Err(LlmError::from_status(status.as_u16(), retry_after, body))
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError> {
        let body = to_openai_request(&self.config.model, request, false);
        let response = self.send(&body, Some(self.config.timeout)).await?;

        let response: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::SerializationError(format!("Failed to parse completion: {}", e))
        })?;

        from_openai_response(response)
    }

    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let body = to_openai_request(&self.config.model, request, true);
        let response = self.send(&body, None).await?;

        let frames = parse_sse_stream(Box::pin(response.bytes_stream()));

        let mut state = StreamState::default();
        let events = frames.flat_map(move |result| match result {
            Ok(frame) => futures::stream::iter(
                from_openai_frame(frame, &mut state)
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<Result<StreamEvent, LlmError>>>(),
            ),
            Err(e) => futures::stream::iter(vec![Err(e)]),
        });

        Ok(Box::pin(events))
    }
}
