//! Streaming Support
//!
//! Folds a Server-Sent Events (SSE) chat completion stream into one
//! [`ChatCompletion`].

use crate::api::completion::{ChatCompletion, Choice, Message, Usage};
use crate::error::{AilabError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inline reasoning block some models emit ahead of the answer
static REASONING_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("reasoning pattern is valid"));

/// A streaming chunk from the API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Chunk ID
    pub id: Option<String>,

    /// Model name
    pub model: Option<String>,

    /// Creation timestamp
    pub created: Option<i64>,

    /// Choices with deltas
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    /// The delta (partial message)
    #[serde(default)]
    pub delta: StreamDelta,

    /// Finish reason (set in final chunk)
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamDelta {
    /// Role (usually only in first chunk)
    pub role: Option<String>,

    /// Content delta
    pub content: Option<String>,
}

/// What a single SSE line means to the reducer
#[derive(Debug)]
pub enum SseEvent {
    /// Blank line, comment, or a field other than `data`
    Skip,

    /// The `[DONE]` sentinel
    Done,

    /// A decoded frame
    Chunk(StreamChunk),
}

/// Accumulator for streaming chunks
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    /// Accumulated content, in arrival order
    pub content: String,

    /// Last non-null finish reason
    pub finish_reason: Option<String>,

    /// Response ID from the first chunk
    pub id: Option<String>,

    /// Model name from the first chunk
    pub model: Option<String>,

    /// Created timestamp from the first chunk
    pub created: Option<i64>,

    /// Number of chunks processed
    pub frames: usize,
}

impl StreamAccumulator {
    /// Create a new accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a streaming chunk
    pub fn process_chunk(&mut self, chunk: StreamChunk) {
        // Metadata is stable across a stream; only the first chunk is read
        if self.frames == 0 {
            self.id = chunk.id;
            self.model = chunk.model;
            self.created = chunk.created;
        }
        self.frames += 1;

        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };

        if let Some(content) = choice.delta.content {
            self.content.push_str(&content);
        }

        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }
    }

    /// Finalize into a completion, stamping `created` with the current time if unseen
    pub fn into_completion(self) -> ChatCompletion {
        ChatCompletion {
            id: self.id,
            object: "chat.completion".to_string(),
            created: self
                .created
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            model: self.model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(strip_reasoning(&self.content).trim()),
                finish_reason: self.finish_reason,
            }],
            usage: Usage::default(),
        }
    }
}

/// Remove every `<think>...</think>` span, tags included.
///
/// An opening tag without a matching close is left in place.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").into_owned()
}

/// Parse one SSE line
pub fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let Some(data) = line.strip_prefix("data: ") else {
        // Blank keep-alives, `:` comments, `event:`/`id:`/`retry:` fields
        return Ok(SseEvent::Skip);
    };

    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        AilabError::Decode(format!("Failed to parse SSE chunk: {}. Data: {}", e, data))
    })?;

    Ok(SseEvent::Chunk(chunk))
}

/// Split a response body into text lines.
///
/// Bytes are buffered until a `\n` arrives, so lines and multi-byte
/// characters cut across network chunks are reassembled. A trailing `\r`
/// is dropped. Whatever remains when the body ends is emitted as a last line.
pub fn sse_lines<S>(mut bytes: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    async_stream::try_stream! {
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = bytes.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=pos).collect();
                yield decode_line(raw)?;
            }
        }

        if !buffer.is_empty() {
            yield decode_line(buffer)?;
        }
    }
}

fn decode_line(mut raw: Vec<u8>) -> Result<String> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    String::from_utf8(raw)
        .map_err(|e| AilabError::Stream(format!("Invalid UTF-8 in event stream: {}", e)))
}

/// Consume SSE lines until `[DONE]` or the end of the stream and build one completion.
///
/// Lines after `[DONE]` are never pulled from the stream. A malformed frame
/// or a transport error aborts the whole reduction.
pub async fn reduce_stream<S>(lines: S) -> Result<ChatCompletion>
where
    S: Stream<Item = Result<String>>,
{
    futures::pin_mut!(lines);
    let mut acc = StreamAccumulator::new();

    while let Some(line) = lines.next().await {
        match parse_sse_line(&line?)? {
            SseEvent::Skip => continue,
            SseEvent::Done => break,
            SseEvent::Chunk(chunk) => acc.process_chunk(chunk),
        }
    }

    debug!(
        frames = acc.frames,
        content_len = acc.content.len(),
        "stream reduced"
    );
    Ok(acc.into_completion())
}
