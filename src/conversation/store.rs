//! In-memory conversation store keyed by session

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::message::{Message, Role};
use super::session::SessionId;
use crate::llm;

/// Ordered message history of one session
///
/// Always starts with the system message. With a history limit set, the
/// oldest user/assistant messages are evicted once the limit is exceeded; the
/// system message is never evicted.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    system_prompt: String,
    history_limit: Option<usize>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, history_limit: Option<usize>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            messages: vec![Message::system(system_prompt.clone())],
            system_prompt,
            history_limit,
        }
    }

    /// Add a message to the end of the conversation
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.enforce_limit();
    }

    /// Full ordered sequence
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The conversation as provider input
    pub fn to_llm_messages(&self) -> Vec<llm::Message> {
        self.messages.iter().map(llm::Message::from).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything except a fresh system message
    pub fn reset(&mut self) {
        self.messages = vec![Message::system(self.system_prompt.clone())];
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.history_limit else {
            return;
        };

        let turns = self
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .count();
        let mut excess = turns.saturating_sub(limit);
        if excess == 0 {
            return;
        }

        self.messages.retain(|m| {
            if excess > 0 && m.role != Role::System {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }
}

/// Sessions kept when no cap is configured
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Slot {
    conversation: Arc<Mutex<Conversation>>,
    /// Store clock value at the last `session` call
    last_used: AtomicU64,
}

impl Slot {
    /// No turn or snapshot holds the conversation
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.conversation) == 1
    }
}

/// Conversations of all sessions
///
/// The map is behind an `RwLock`; each conversation has its own `Mutex` so a
/// turn can hold one session without blocking the others. At most
/// `max_sessions` are kept: creating one more evicts the least recently used
/// idle session.
pub struct ConversationStore {
    sessions: RwLock<HashMap<SessionId, Slot>>,
    clock: AtomicU64,
    system_prompt: String,
    history_limit: Option<usize>,
    max_sessions: usize,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            system_prompt: system_prompt.into(),
            history_limit: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Cap the number of user/assistant messages kept per session
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Cap the number of sessions kept in memory
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the conversation for a session, creating it if needed
    pub async fn session(&self, id: &SessionId) -> Arc<Mutex<Conversation>> {
        if let Some(slot) = self.sessions.read().await.get(id) {
            slot.last_used.store(self.tick(), Ordering::Relaxed);
            return Arc::clone(&slot.conversation);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(slot) = sessions.get(id) {
            slot.last_used.store(self.tick(), Ordering::Relaxed);
            return Arc::clone(&slot.conversation);
        }

        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }

        debug!(session = %id, "creating conversation");
        let conversation = Arc::new(Mutex::new(Conversation::new(
            self.system_prompt.clone(),
            self.history_limit,
        )));
        sessions.insert(
            id.clone(),
            Slot {
                conversation: Arc::clone(&conversation),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        conversation
    }

    /// Snapshot of a session, `None` if it was never used or was evicted
    ///
    /// Waits for any turn in progress on that session to finish.
    pub async fn history(&self, id: &SessionId) -> Option<Vec<Message>> {
        let conversation = self.conversation(id).await?;
        let snapshot = conversation.lock().await.snapshot();
        Some(snapshot)
    }

    /// Reset a session to its system message; false if it does not exist
    pub async fn reset(&self, id: &SessionId) -> bool {
        let Some(conversation) = self.conversation(id).await else {
            return false;
        };
        conversation.lock().await.reset();
        true
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn conversation(&self, id: &SessionId) -> Option<Arc<Mutex<Conversation>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|slot| Arc::clone(&slot.conversation))
    }
}

/// Drop the idle session that was used longest ago
///
/// Sessions with a turn in flight are never evicted; when every session is
/// busy the map grows past its cap until one finishes.
fn evict_least_recent(sessions: &mut HashMap<SessionId, Slot>) {
    let oldest = sessions
        .iter()
        .filter(|(_, slot)| slot.is_idle())
        .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
        .map(|(id, _)| id.clone());

    match oldest {
        Some(id) => {
            sessions.remove(&id);
            debug!(session = %id, "evicted least recently used conversation");
        }
        None => warn!(
            sessions = sessions.len(),
            "session cap reached but every session is busy"
        ),
    }
}
