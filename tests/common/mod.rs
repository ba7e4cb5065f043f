//! Shared fixtures for the HTTP integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use mentorbot::conversation::ConversationStore;
use mentorbot::llm::{
    Completion, EventStream, FinishReason, GenerateRequest, LlmError, LlmProvider, StreamEvent,
    UsageMetadata,
};
use mentorbot::relay::CompletionRelay;
use mentorbot::state::AppState;

pub const SYSTEM_PROMPT: &str = "You are a test mentor.";

/// Provider that answers every request with the same fragments
///
/// Records each request so tests can inspect the context that was sent.
pub struct ScriptedProvider {
    fragments: Vec<String>,
    fail: bool,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn replying(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fragments: Vec::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: GenerateRequest) -> Result<(), LlmError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(LlmError::HttpError {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError> {
        self.record(request)?;
        Ok(Completion {
            id: "mock-1".to_string(),
            text: self.fragments.concat(),
            finish_reason: FinishReason::Stop,
            usage: Some(UsageMetadata::new(10, 5)),
        })
    }

    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.record(request)?;
        let fragments = self.fragments.clone();

        Ok(Box::pin(async_stream::stream! {
            yield Ok(StreamEvent::MessageStart { id: "mock-1".to_string() });
            for text in fragments {
                yield Ok(StreamEvent::TextDelta { text });
            }
            yield Ok(StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: Some(UsageMetadata::new(10, 5)),
            });
        }))
    }
}

pub fn app_state(provider: Arc<ScriptedProvider>, clean_output: bool) -> Arc<AppState> {
    let store = Arc::new(ConversationStore::new(SYSTEM_PROMPT));
    let relay = CompletionRelay::new(provider, store).with_cleaning(clean_output);
    Arc::new(AppState::new(relay))
}
