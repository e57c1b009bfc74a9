//! LLM Gateway Client
//!
//! Lists models and runs chat inference against the OpenAI-compatible gateway.
//! Inference is always streamed and folded into a single completion.

use crate::api::completion::{ChatCompletion, ChatRequest, ModelInfo, ModelList};
use crate::api::streaming::{reduce_stream, sse_lines};
use crate::client::{Auth, HttpClient};
use crate::config::{ClientConfig, ConfigLoader, Service, DEFAULT_LLM_URL};
use crate::error::Result;
use tracing::debug;

/// Client for the LLM inference gateway
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: ClientConfig,
    http: HttpClient,
}

impl LlmClient {
    /// Create a client for the gateway at `base_url`
    pub fn new(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key, base_url)?)
    }

    /// Client for the public gateway
    pub fn with_default_url(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_LLM_URL)
    }

    /// Create a client from an already validated configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::new(Auth::Bearer, config.api_key())?;
        Ok(Self { config, http })
    }

    /// Reuse an existing reqwest client (and its connection pool)
    pub fn with_http_client(config: ClientConfig, client: reqwest::Client) -> Result<Self> {
        let http = HttpClient::with_client(client, Auth::Bearer, config.api_key())?;
        Ok(Self { config, http })
    }

    /// Build from settings files and the `llm` API key environment variable
    pub fn from_env() -> Result<Self> {
        Self::from_config(ConfigLoader::new()?.client_config(Service::Llm)?)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Models served by the gateway; empty if the answer carries no `data`
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let list: ModelList = self
            .http
            .get(
                &self.config.endpoint("/v1/models"),
                self.config.timeouts().request,
            )
            .await?;

        Ok(list.into_models())
    }

    /// Ask `model` a single user `prompt`
    pub async fn inference(&self, model: &str, prompt: &str) -> Result<ChatCompletion> {
        self.chat(&ChatRequest::new(model, prompt)).await
    }

    /// Run a chat request as a stream and reduce it to one completion.
    ///
    /// Returns only once the stream has ended or sent `[DONE]`. Reasoning
    /// blocks are removed from the content and usage is reported as zero.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let body = request.to_body()?;
        let bytes = self
            .http
            .post_stream(
                &self.config.endpoint("/v1/chat/completions"),
                &body,
                self.config.timeouts().stream,
            )
            .await?;

        let completion = reduce_stream(sse_lines(bytes)).await?;
        debug!(
            model = %request.model,
            finish_reason = completion.finish_reason().unwrap_or("none"),
            "inference finished"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::error::AilabError;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    const SSE_BODY: &str = concat!(
        "data: {\"id\":\"chatcmpl-9\",\"object\":\"chat.completion.chunk\",\"created\":1700000000,",
        "\"model\":\"deepseek-r1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",",
        "\"content\":\"<think>The user greets\"}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" me.</think>\\n\\nHello\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there!\"}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    #[test]
    fn test_empty_key_rejected() {
        let err = LlmClient::new("", DEFAULT_LLM_URL).unwrap_err();
        assert!(matches!(err, AilabError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer llm-key")
            .with_status(200)
            .with_body(
                json!({
                    "object": "list",
                    "data": [
                        {"id": "deepseek-r1", "object": "model", "created": 1700000000, "owned_by": "ailab"},
                        {"id": "GPT-OSS-120", "object": "model", "created": 1700000001, "owned_by": "ailab"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = LlmClient::new("llm-key", format!("{}/", server.url())).unwrap();
        let models = client.list_models().await.unwrap();

        mock.assert_async().await;
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["deepseek-r1", "GPT-OSS-120"]);
    }

    #[tokio::test]
    async fn test_list_models_without_data() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        assert!(client.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_models_lenient_entries() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body(r#"{"data": [{"object": "model"}, {"id": "deepseek-r1"}]}"#)
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "");
        assert_eq!(models[1].id, "deepseek-r1");
    }

    #[tokio::test]
    async fn test_list_models_null_data() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body(r#"{"data": null}"#)
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        assert!(client.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inference_reduces_stream() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer llm-key")
            .match_body(Matcher::Json(json!({
                "model": "deepseek-r1",
                "messages": [{"role": "user", "content": "Hi"}],
                "stream": true
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(SSE_BODY)
            .create_async()
            .await;

        let client = LlmClient::new("llm-key", server.url()).unwrap();
        let completion = client.inference("deepseek-r1", "Hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.id.as_deref(), Some("chatcmpl-9"));
        assert_eq!(completion.model.as_deref(), Some("deepseek-r1"));
        assert_eq!(completion.created, 1700000000);
        assert_eq!(completion.content(), Some("Hello there!"));
        assert_eq!(completion.finish_reason(), Some("stop"));
        assert_eq!(completion.usage.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_chat_forwards_extra_params() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Json(json!({
                "model": "GPT-OSS-120",
                "messages": [{"role": "user", "content": "Hi"}],
                "temperature": 0.25,
                "reasoning_effort": "low",
                "stream": true
            })))
            .with_status(200)
            .with_body("data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: [DONE]\n\n")
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        let request = ChatRequest::new("GPT-OSS-120", "Hi")
            .with_temperature(0.25)
            .with_param("reasoning_effort", "low");
        let completion = client.chat(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.content(), Some("ok"));
    }

    #[tokio::test]
    async fn test_inference_status_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("data: {\"choices\":[]}\n\n")
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        let err = client.inference("m", "p").await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
    }

    #[tokio::test]
    async fn test_inference_malformed_frame() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: oops\n\n")
            .create_async()
            .await;

        let client = LlmClient::new("k", server.url()).unwrap();
        let err = client.inference("m", "p").await.unwrap_err();
        assert!(matches!(err, AilabError::Decode(_)));
    }

    #[tokio::test]
    async fn test_inference_defaults_created() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n")
            .create_async()
            .await;

        let config = ClientConfig::new("k", server.url())
            .unwrap()
            .with_timeouts(Timeouts {
                request: Duration::from_secs(5),
                stream: Duration::from_secs(30),
            });
        let client = LlmClient::from_config(config).unwrap();

        let before = chrono::Utc::now().timestamp();
        let completion = client.inference("m", "p").await.unwrap();
        assert!(completion.created >= before);
        assert!(completion.created - before < 5);
    }
}
