//! Service Settings
//!
//! Defines the configuration file schema for the three ailab services.

use crate::config::client::{ClientConfig, Timeouts};
use crate::error::{AilabError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Task-submission service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<ServiceSettings>,

    /// LLM gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<ServiceSettings>,

    /// Similarity service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<ServiceSettings>,
}

impl ServicesConfig {
    /// Overlay `other` on top of this config; services present in `other` win
    pub fn merge(&mut self, other: ServicesConfig) {
        if other.tasks.is_some() {
            self.tasks = other.tasks;
        }
        if other.llm.is_some() {
            self.llm = other.llm;
        }
        if other.similarity.is_some() {
            self.similarity = other.similarity;
        }
    }

    /// Settings for a service, or a config error naming the missing entry
    pub fn service(&self, service: Service) -> Result<&ServiceSettings> {
        let settings = match service {
            Service::Tasks => self.tasks.as_ref(),
            Service::Llm => self.llm.as_ref(),
            Service::Similarity => self.similarity.as_ref(),
        };
        settings.ok_or_else(|| {
            AilabError::Config(format!("No settings for service '{}'", service.name()))
        })
    }
}

/// The three remote services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Tasks,
    Llm,
    Similarity,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Tasks => "tasks",
            Service::Llm => "llm",
            Service::Similarity => "similarity",
        }
    }
}

/// Configuration for a single service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL for the API
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Optional environment variable overriding the base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_env: Option<String>,

    /// Timeout for plain requests, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Timeout for streaming requests, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_timeout_secs: Option<u64>,
}

impl ServiceSettings {
    /// Get the effective base URL (from env var if configured, otherwise default)
    pub fn get_base_url(&self) -> String {
        if let Some(env_var) = &self.api_base_env {
            if let Ok(url) = std::env::var(env_var) {
                return url;
            }
        }
        self.base_url.clone()
    }

    /// Timeouts with configured overrides applied
    pub fn timeouts(&self) -> Timeouts {
        let defaults = Timeouts::default();
        Timeouts {
            request: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request),
            stream: self
                .stream_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.stream),
        }
    }

    /// Resolve the API key from the environment and build a client config
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = std::env::var(&self.api_key_env).map_err(|_| {
            AilabError::InvalidArgument(format!(
                "API key cannot be empty. Set the {} environment variable.",
                self.api_key_env
            ))
        })?;

        Ok(ClientConfig::new(api_key, self.get_base_url())?.with_timeouts(self.timeouts()))
    }
}
