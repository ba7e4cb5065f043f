// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::conversation::{Message, SessionId};

pub const STATUS_MESSAGE: &str = "MentorBot API is running!";

// GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

impl StatusResponse {
    pub fn running() -> Self {
        Self {
            message: STATUS_MESSAGE.to_string(),
        }
    }
}

// POST /chat and POST /chat-stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// Missing field means an empty message
    #[serde(default)]
    pub message: String,
}

// POST /chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

// GET /history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
}

// Any 4xx/5xx
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
