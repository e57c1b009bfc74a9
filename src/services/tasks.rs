//! Task Submission Client
//!
//! Queues prompts on the ai-tasks service; results are delivered to a callback URL.

use crate::client::{Auth, HttpClient};
use crate::config::{ClientConfig, ConfigLoader, Service, DEFAULT_TASKS_URL};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// Body of `POST /api/v1/tasks`
#[derive(Debug, Serialize)]
struct TaskSubmission<'a> {
    prompt: &'a str,
    callback_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
}

/// Client for the asynchronous task-submission service
#[derive(Debug, Clone)]
pub struct TasksClient {
    config: ClientConfig,
    http: HttpClient,
}

impl TasksClient {
    /// Create a client for the ai-tasks service at `base_url`
    pub fn new(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key, base_url)?)
    }

    /// Client for the public ai-tasks endpoint
    pub fn with_default_url(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_TASKS_URL)
    }

    /// Create a client from an already validated configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::new(Auth::ApiKeyHeader, config.api_key())?;
        Ok(Self { config, http })
    }

    /// Reuse an existing reqwest client (and its connection pool)
    pub fn with_http_client(config: ClientConfig, client: reqwest::Client) -> Result<Self> {
        let http = HttpClient::with_client(client, Auth::ApiKeyHeader, config.api_key())?;
        Ok(Self { config, http })
    }

    /// Build from settings files and the `tasks` API key environment variable
    pub fn from_env() -> Result<Self> {
        Self::from_config(ConfigLoader::new()?.client_config(Service::Tasks)?)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a prompt for asynchronous processing.
    ///
    /// `provider` is only sent when given and non-empty. Returns the
    /// service's JSON answer unchanged.
    pub async fn submit_task(
        &self,
        prompt: &str,
        callback_url: &str,
        provider: Option<&str>,
    ) -> Result<Value> {
        let body = TaskSubmission {
            prompt,
            callback_url,
            provider: provider.filter(|p| !p.is_empty()),
        };

        self.http
            .post(
                &self.config.endpoint("/api/v1/tasks"),
                &body,
                self.config.timeouts().request,
            )
            .await
    }
}
