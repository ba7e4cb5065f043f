// Shared application state handed to every handler

use std::sync::Arc;

use crate::conversation::ConversationStore;
use crate::relay::CompletionRelay;

pub struct AppState {
    pub relay: CompletionRelay,
}

impl AppState {
    pub fn new(relay: CompletionRelay) -> Self {
        Self { relay }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        self.relay.store()
    }
}
