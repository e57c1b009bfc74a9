//! Client Configuration
//!
//! Credentials, base URL and timeouts held by every service client.

use crate::error::{AilabError, Result};
use std::time::Duration;

/// Default base URL of the task-submission service
pub const DEFAULT_TASKS_URL: &str = "https://ai-tasks.ailab.sh";

/// Default base URL of the LLM gateway
pub const DEFAULT_LLM_URL: &str = "https://api.ailab.sh";

/// Default base URL of the similarity service
pub const DEFAULT_SIMILARITY_URL: &str = "https://similarity.ailab.sh";

/// Per-call timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Applied to every plain request/response call
    pub request: Duration,

    /// Applied to streaming inference, which drains the whole body
    pub stream: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
            stream: Duration::from_secs(600),
        }
    }
}

/// Validated connection settings for one service
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeouts: Timeouts,
}

impl ClientConfig {
    /// Create a config, rejecting an empty API key and stripping trailing slashes
    pub fn new(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AilabError::InvalidArgument(
                "API key cannot be empty.".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            timeouts: Timeouts::default(),
        })
    }

    /// Replace the default timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Join the base URL with an absolute path such as `/api/pages`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Keeps the API key out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
