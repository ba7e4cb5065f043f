use std::time::Duration;

use crate::llm::core::error::LlmError;

/// Errors that can occur while relaying a turn
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Error from the LLM provider
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Provider stream closed without a completion signal
    #[error("Stream ended unexpectedly")]
    UnexpectedStreamEnd,

    /// Provider sent nothing for too long
    #[error("Provider stream idle for more than {0:?}")]
    IdleTimeout(Duration),

    /// The client stopped reading the stream
    #[error("Client disconnected mid-stream")]
    Cancelled,
}
