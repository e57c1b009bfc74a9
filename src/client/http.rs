//! HTTP Client
//!
//! Single-attempt JSON and streaming requests over a shared reqwest client.

use crate::error::{truncate, AilabError, Result};
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw response body as it arrives from the network
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes>> + Send>>;

/// How the API key is presented to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <key>`
    Bearer,

    /// `X-API-Key: <key>`
    ApiKeyHeader,
}

impl Auth {
    /// Headers sent on every request: JSON content type plus the credential
    pub fn headers(self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let (name, value) = match self {
            Auth::Bearer => (AUTHORIZATION, format!("Bearer {}", api_key)),
            Auth::ApiKeyHeader => (HeaderName::from_static("x-api-key"), api_key.to_string()),
        };
        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| AilabError::InvalidArgument(format!("Invalid API key format: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(name, value);

        Ok(headers)
    }
}

/// HTTP client bound to one service's credentials
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client
    client: Client,

    /// Headers attached to every request
    headers: HeaderMap,
}

impl HttpClient {
    /// Create a new HTTP client with its own connection pool
    pub fn new(auth: Auth, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AilabError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, auth, api_key)
    }

    /// Wrap a caller-built reqwest client
    pub fn with_client(client: Client, auth: Auth, api_key: &str) -> Result<Self> {
        Ok(Self {
            client,
            headers: auth.headers(api_key)?,
        })
    }

    /// GET and decode a JSON body
    pub async fn get<R>(&self, url: &str, timeout: Duration) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.execute(self.request(Method::GET, url, timeout)).await?;
        decode(response).await
    }

    /// POST a JSON body and decode the JSON answer
    pub async fn post<T, R>(&self, url: &str, body: &T, timeout: Duration) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::POST, url, timeout).json(body);
        decode(self.execute(request).await?).await
    }

    /// PUT a JSON body and decode the JSON answer
    pub async fn put<T, R>(&self, url: &str, body: &T, timeout: Duration) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::PUT, url, timeout).json(body);
        decode(self.execute(request).await?).await
    }

    /// DELETE; the response body is ignored
    pub async fn delete(&self, url: &str, timeout: Duration) -> Result<()> {
        self.execute(self.request(Method::DELETE, url, timeout))
            .await
            .map(|_| ())
    }

    /// POST a JSON body and hand back the response body as a byte stream.
    ///
    /// The status is checked before the stream is returned, so a non-2xx
    /// answer fails here without any of the body being consumed as frames.
    pub async fn post_stream<T>(&self, url: &str, body: &T, timeout: Duration) -> Result<ByteStream>
    where
        T: Serialize + ?Sized,
    {
        use async_stream::stream;
        use futures::StreamExt;

        let request = self.request(Method::POST, url, timeout).json(body);
        let response = self.execute(request).await?;

        let mut byte_stream = response.bytes_stream();
        let s = stream! {
            while let Some(chunk) = byte_stream.next().await {
                yield chunk.map_err(AilabError::from);
            }
        };

        Ok(Box::pin(s))
    }

    fn request(&self, method: Method, url: &str, timeout: Duration) -> RequestBuilder {
        debug!(method = method.as_str(), url, timeout_secs = timeout.as_secs(), "sending request");
        self.client
            .request(method, url)
            .headers(self.headers.clone())
            .timeout(timeout)
    }

    /// Send once; any non-2xx status becomes an error
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), url = %url, "request failed");

        Err(AilabError::status(status.as_u16(), url, &body))
    }
}

/// Read the whole body and parse it as JSON
async fn decode<R: DeserializeOwned>(response: Response) -> Result<R> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        AilabError::Decode(format!(
            "Failed to parse response: {}. Body: {}",
            e,
            truncate(&body, 500)
        ))
    })
}
