//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

use super::{
    error::LlmError,
    types::{Completion, GenerateRequest, StreamEvent},
};

/// Stream of events produced by [`LlmProvider::stream_generate`]
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete reply in one round trip
    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError>;

    /// Stream generate content from the LLM
    ///
    /// Resolves once the provider has accepted the request; the returned stream
    /// then yields text deltas and ends after a `MessageEnd` event.
    ///
    /// # Errors
    /// Fails before any event is produced if the request is rejected.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;
}
