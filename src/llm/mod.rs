//! LLM Abstraction Layer
//!
//! A provider trait plus a client for OpenAI-compatible chat completion APIs.

pub mod core;
pub mod openai;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{
        Completion, FinishReason, GenerateRequest, Message, MessageRole, StreamEvent,
        UsageMetadata,
    },
};

pub use openai::{OpenAiClient, OpenAiConfig};
