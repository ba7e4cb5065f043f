// Handlers module

pub mod chat;
pub mod chat_stream;
pub mod history;
pub mod status;

pub use chat::chat_handler;
pub use chat_stream::chat_stream_handler;
pub use history::{get_history_handler, reset_history_handler};
pub use status::status_handler;
