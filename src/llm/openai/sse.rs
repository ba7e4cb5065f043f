//! Server-Sent Events (SSE) parser for chat completion streams

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::{ChatCompletionChunk, OpenAiErrorEnvelope, SseFrame};

/// Parse a stream of bytes as chat completion SSE frames
///
/// The wire format is a sequence of `data:` events separated by a blank line,
/// ending with a `[DONE]` sentinel:
/// ```text
/// data: {"id":"chatcmpl-1","choices":[{"delta":{"content":"Hel"}}]}
///
/// data: [DONE]
/// ```
///
/// Bytes are buffered until a full event is available, so an event (or a
/// multi-byte UTF-8 character) split across network chunks is decoded intact.
/// Comment lines (`: keep-alive`) and events without data are skipped.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<SseFrame, LlmError>> + Send>> {
    let mut buffer: Vec<u8> = Vec::new();

    let frame_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut frames = Vec::new();
        while let Some(event_end) = find_event_end(&buffer) {
            let event_bytes: Vec<u8> = buffer.drain(..event_end + 2).collect();
            let event_text = match std::str::from_utf8(&event_bytes[..event_end]) {
                Ok(t) => t,
                Err(e) => {
                    frames.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(frame) = parse_event(event_text) {
                frames.push(frame);
            }
        }

        futures::stream::iter(frames)
    });

    Box::pin(frame_stream)
}

fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Parse a single SSE event from its text representation
fn parse_event(event_text: &str) -> Option<Result<SseFrame, LlmError>> {
    let mut data_lines: Vec<&str> = Vec::new();

    for line in event_text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(data_val) = line.strip_prefix("data:") {
            data_lines.push(data_val.strip_prefix(' ').unwrap_or(data_val));
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    if data == "[DONE]" {
        return Some(Ok(SseFrame::Done));
    }

    if let Ok(chunk) = serde_json::from_str::<ChatCompletionChunk>(data) {
        return Some(Ok(SseFrame::Chunk(chunk)));
    }

    match serde_json::from_str::<OpenAiErrorEnvelope>(data) {
        Ok(envelope) => Some(Ok(SseFrame::Error(envelope.error))),
        Err(e) => Some(Err(LlmError::SerializationError(format!(
            "Failed to parse SSE chunk: {}. Data: {}",
            e, data
        )))),
    }
}
