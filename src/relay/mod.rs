//! Completion relay
//!
//! This module drives one conversational turn:
//! - appends the user message to the session's conversation
//! - sends the whole conversation to the provider
//! - returns the reply in one piece, or forwards it fragment by fragment
//! - appends the assistant reply once the provider signals completion
//!
//! A turn holds its session's lock from the user append to the assistant
//! append, so turns in one session never interleave. Streaming turns run in a
//! spawned task; if the client disconnects or the upstream fails, the partial
//! reply is discarded and nothing is appended for it.

pub mod clean;
mod error;
pub mod persona;

pub use error::RelayError;
pub use persona::Persona;

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::conversation::{Conversation, ConversationStore, Message, SessionId};
use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{Completion, FinishReason, GenerateRequest, StreamEvent, UsageMetadata},
};
use clean::{clean_fragment, clean_reply};

/// Fragments buffered between the relay task and the HTTP body
const FRAGMENT_BUFFER: usize = 32;

/// Longest wait for the next upstream event before a streamed turn is abandoned
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Text fragments of a streamed reply, in order
///
/// Ends after the last fragment on success. On upstream failure the final
/// item is an `Err`.
pub type FragmentStream = ReceiverStream<Result<String, RelayError>>;

/// Relays turns between the conversation store and an LLM provider
pub struct CompletionRelay {
    provider: Arc<dyn LlmProvider>,
    store: Arc<ConversationStore>,
    config: GenerationConfig,
    clean_output: bool,
    idle_timeout: Duration,
}

/// Outcome of a fully consumed upstream stream
struct StreamedReply {
    text: String,
    fragments: usize,
    finish_reason: FinishReason,
    usage: Option<UsageMetadata>,
}

impl CompletionRelay {
    pub fn new(provider: Arc<dyn LlmProvider>, store: Arc<ConversationStore>) -> Self {
        Self {
            provider,
            store,
            config: GenerationConfig::default(),
            clean_output: false,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set the generation parameters sent with every request
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Run replies through the markdown cleaning filter
    pub fn with_cleaning(mut self, enabled: bool) -> Self {
        self.clean_output = enabled;
        self
    }

    /// Abandon a streamed turn when the provider goes quiet for this long
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn cleans_output(&self) -> bool {
        self.clean_output
    }

    fn request_for(&self, conversation: &Conversation) -> GenerateRequest {
        GenerateRequest {
            messages: conversation.to_llm_messages(),
            config: self.config.clone(),
        }
    }

    /// Run a blocking turn and return the full reply
    ///
    /// # Errors
    ///
    /// Provider failures are returned as is. The user message stays in the
    /// conversation; no assistant message is added.
    pub async fn complete(
        &self,
        session: &SessionId,
        text: impl Into<String>,
    ) -> Result<String, RelayError> {
        let conversation = self.store.session(session).await;
        let mut conversation = conversation.lock().await;

        conversation.append(Message::user(text));
        let request = self.request_for(&conversation);

        let Completion {
            text,
            finish_reason,
            usage,
            ..
        } = self.provider.generate(request).await.map_err(|e| {
            warn!(session = %session, error = %e, "completion failed");
            e
        })?;

        let reply = if self.clean_output {
            clean_reply(&text)
        } else {
            text
        };

        conversation.append(Message::assistant(reply.clone()));
        info!(
            session = %session,
            chars = reply.len(),
            finish_reason = ?finish_reason,
            output_tokens = usage.map(|u| u.output_tokens),
            "reply committed"
        );

        Ok(reply)
    }

    /// Start a streaming turn
    ///
    /// Resolves once the provider has accepted the request. Fragments are then
    /// produced by a background task that owns the session until the turn ends.
    ///
    /// # Errors
    ///
    /// Fails without spawning anything if the provider rejects the request.
    pub async fn stream(
        &self,
        session: &SessionId,
        text: impl Into<String>,
    ) -> Result<FragmentStream, RelayError> {
        let conversation = self.store.session(session).await;
        let mut conversation = conversation.lock_owned().await;

        conversation.append(Message::user(text));
        let request = self.request_for(&conversation);

        let upstream = self.provider.stream_generate(request).await.map_err(|e| {
            warn!(session = %session, error = %e, "failed to open upstream stream");
            e
        })?;

        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);
        let clean = self.clean_output;
        let idle_timeout = self.idle_timeout;
        let session = session.clone();

        tokio::spawn(async move {
            match forward_fragments(upstream, &tx, clean, idle_timeout).await {
                Ok(reply) => {
                    info!(
                        session = %session,
                        fragments = reply.fragments,
                        chars = reply.text.len(),
                        finish_reason = ?reply.finish_reason,
                        output_tokens = reply.usage.map(|u| u.output_tokens),
                        "streamed reply committed"
                    );
                    conversation.append(Message::assistant(reply.text));
                }
                Err(RelayError::Cancelled) => {
                    warn!(session = %session, "client disconnected, partial reply discarded");
                }
                Err(e) => {
                    warn!(session = %session, error = %e, "stream failed, partial reply discarded");
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

/// Forward upstream text to `tx` until the provider signals completion
///
/// Fails with `IdleTimeout` when no upstream event arrives within
/// `idle_timeout`.
async fn forward_fragments(
    mut upstream: EventStream,
    tx: &mpsc::Sender<Result<String, RelayError>>,
    clean: bool,
    idle_timeout: Duration,
) -> Result<StreamedReply, RelayError> {
    let mut text = String::new();
    let mut fragments = 0;

    loop {
        let event = tokio::select! {
            biased;
            _ = tx.closed() => return Err(RelayError::Cancelled),
            event = tokio::time::timeout(idle_timeout, upstream.next()) => {
                event.map_err(|_| RelayError::IdleTimeout(idle_timeout))?
            }
        };

        let Some(event) = event else {
            return Err(RelayError::UnexpectedStreamEnd);
        };

        match event? {
            StreamEvent::MessageStart { id } => debug!(id = %id, "upstream stream opened"),
            StreamEvent::TextDelta { text: delta } => {
                let fragment = if clean { clean_fragment(&delta) } else { delta };
                if fragment.is_empty() {
                    continue;
                }

                text.push_str(&fragment);
                fragments += 1;
                if tx.send(Ok(fragment)).await.is_err() {
                    return Err(RelayError::Cancelled);
                }
            }
            StreamEvent::MessageEnd {
                finish_reason,
                usage,
            } => {
                return Ok(StreamedReply {
                    text,
                    fragments,
                    finish_reason,
                    usage,
                })
            }
            StreamEvent::Error { error } => return Err(LlmError::StreamError(error).into()),
        }
    }
}
