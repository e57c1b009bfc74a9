//! API Module
//!
//! Chat completion types and the SSE stream reducer.

pub mod completion;
pub mod streaming;

pub use completion::{ChatCompletion, ChatRequest, Choice, Message, ModelInfo, Usage};
pub use streaming::{
    parse_sse_line, reduce_stream, sse_lines, strip_reasoning, SseEvent, StreamAccumulator,
    StreamChoice, StreamChunk, StreamDelta,
};
