//! OpenAI-compatible provider implementation
//!
//! Talks to any endpoint that speaks the `/chat/completions` protocol, blocking
//! or streamed as Server-Sent Events.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::{OpenAiClient, OpenAiConfig};
