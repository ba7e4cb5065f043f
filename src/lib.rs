// Startup configuration
pub mod config;

// HTTP Server modules
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

// Conversation history and the completion relay
pub mod conversation;
pub mod relay;

// LLM abstraction layer
pub mod llm;
