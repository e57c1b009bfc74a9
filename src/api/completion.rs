//! Chat Completion API
//!
//! Request and response shapes of the OpenAI-compatible LLM gateway.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user" or "assistant"
    pub role: String,

    /// Message text
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model alias or name (e.g. "deepseek-r1")
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Model-specific parameters forwarded without validation
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// Create a request carrying a single user prompt
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature: None,
            max_tokens: None,
            top_p: None,
            stop: None,
            extra: Map::new(),
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set top-p
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Add one pass-through parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build the wire body.
    ///
    /// Pass-through parameters overwrite same-named fields; `stream` is
    /// always forced on since the gateway answer is reduced from SSE frames.
    pub fn to_body(&self) -> Result<Value> {
        let mut body = serde_json::to_value(self)?;

        if let Some(obj) = body.as_object_mut() {
            for (key, value) in &self.extra {
                obj.insert(key.clone(), value.clone());
            }
            obj.insert("stream".to_string(), Value::Bool(true));
        }

        Ok(body)
    }
}

/// A model advertised by `/v1/models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub object: String,

    #[serde(default)]
    pub created: Option<i64>,

    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Envelope of the `/v1/models` response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    data: Option<Vec<ModelInfo>>,
}

impl ModelList {
    /// Listed models; a missing or null `data` is an empty list
    pub fn into_models(self) -> Vec<ModelInfo> {
        self.data.unwrap_or_default()
    }
}

/// Chat completion assembled from a streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Response ID, when the stream carried one
    pub id: Option<String>,

    /// Always "chat.completion"
    pub object: String,

    /// Creation timestamp (Unix seconds)
    pub created: i64,

    /// Model used, when the stream carried one
    pub model: Option<String>,

    /// Response choices; a streamed completion has exactly one
    pub choices: Vec<Choice>,

    /// Token usage; streamed responses do not report it, so all zero
    pub usage: Usage,
}

/// A choice in the completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,

    pub message: Message,

    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    pub total_tokens: u32,
}

impl ChatCompletion {
    /// Get the first message content
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }

    /// Get the first finish reason
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}
