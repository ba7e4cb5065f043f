//! Mapping between abstraction types and chat completions wire types

use crate::llm::core::{
    error::LlmError,
    types::{Completion, FinishReason, GenerateRequest, Message, StreamEvent, UsageMetadata},
};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAiErrorBody, OpenAiUsage,
    SseFrame, StreamOptions,
};

/// Convert our abstraction request to the wire request
pub fn to_openai_request(model: &str, request: GenerateRequest, stream: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: request.messages.into_iter().map(to_openai_message).collect(),
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        stop: request.config.stop_sequences,
        stream,
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

fn to_openai_message(message: Message) -> ChatMessage {
    ChatMessage {
        role: message.role.as_str().to_string(),
        content: message.content,
    }
}

fn to_usage(usage: OpenAiUsage) -> UsageMetadata {
    UsageMetadata::new(usage.prompt_tokens, usage.completion_tokens)
}

/// Convert a non-streaming response, taking the first choice
pub fn from_openai_response(response: ChatCompletionResponse) -> Result<Completion, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ProviderError {
            code: "empty_response".to_string(),
            message: "No choices in response".to_string(),
        })?;

    Ok(Completion {
        id: response.id,
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_provider)
            .unwrap_or(FinishReason::Stop),
        usage: response.usage.map(to_usage),
    })
}

/// Convert an in-stream or HTTP error body
pub fn from_openai_error(error: OpenAiErrorBody) -> LlmError {
    LlmError::ProviderError {
        code: error
            .code
            .or(error.error_type)
            .unwrap_or_else(|| "unknown".to_string()),
        message: error.message,
    }
}

/// State carried across the frames of one streaming response
///
/// The finish reason and the usage arrive on separate chunks ahead of the
/// `[DONE]` sentinel, so both are held here until the stream closes.
#[derive(Debug, Default)]
pub struct StreamState {
    started: bool,
    finish_reason: Option<FinishReason>,
    usage: Option<UsageMetadata>,
}

/// Convert one SSE frame to our abstraction's events
pub fn from_openai_frame(frame: SseFrame, state: &mut StreamState) -> Vec<StreamEvent> {
    match frame {
        SseFrame::Chunk(chunk) => {
            let mut events = Vec::new();

            if !state.started {
                state.started = true;
                events.push(StreamEvent::MessageStart { id: chunk.id });
            }

            if let Some(usage) = chunk.usage {
                state.usage = Some(to_usage(usage));
            }

            // n is always 1 for chat, so only the first choice carries text
            if let Some(choice) = chunk.choices.into_iter().next() {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    events.push(StreamEvent::TextDelta { text });
                }
                if let Some(reason) = choice.finish_reason {
                    state.finish_reason = Some(FinishReason::from_provider(&reason));
                }
            }

            events
        }
        SseFrame::Error(error) => vec![StreamEvent::Error {
            error: from_openai_error(error).to_string(),
        }],
        SseFrame::Done => vec![StreamEvent::MessageEnd {
            finish_reason: state.finish_reason.take().unwrap_or(FinishReason::Stop),
            usage: state.usage.take(),
        }],
    }
}
