//! Conversation history, one ordered log per session

mod message;
mod session;
mod store;

pub use message::{Message, Role};
pub use session::{SessionId, SessionIdError, DEFAULT_SESSION};
pub use store::{Conversation, ConversationStore, DEFAULT_MAX_SESSIONS};
