//! Similarity Service Client
//!
//! CRUD over the pages, sites and articles indexed by the similarity service,
//! plus the similarity query itself. Records come back as raw JSON.

use crate::client::{Auth, HttpClient};
use crate::config::{ClientConfig, ConfigLoader, Service, DEFAULT_SIMILARITY_URL};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct NewPage<'a> {
    #[serde(rename = "idPage")]
    id_page: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct PageUpdate<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct NewSite<'a> {
    #[serde(rename = "idSite")]
    id_site: i64,
    #[serde(flatten)]
    fields: &'a SiteFields,
}

/// Optional site attributes; unset fields are left out of the request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SiteFields {
    /// Set the site name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the site URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct NewArticle<'a> {
    #[serde(rename = "idArticle")]
    id_article: i64,
    #[serde(rename = "idSite")]
    id_site: i64,
    text: &'a str,
}

/// Fields to change on an article; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleUpdate {
    #[serde(rename = "idSite", skip_serializing_if = "Option::is_none")]
    pub id_site: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ArticleUpdate {
    /// Move the article to another site
    pub fn with_site(mut self, site_id: i64) -> Self {
        self.id_site = Some(site_id);
        self
    }

    /// Replace the article text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct SimilarityQuery<'a> {
    #[serde(rename = "idSite")]
    id_site: i64,
    #[serde(rename = "idArticleSnapshot")]
    id_article_snapshot: i64,
    text: &'a str,
}

/// Client for the text-similarity / indexing service
#[derive(Debug, Clone)]
pub struct SimilarityClient {
    config: ClientConfig,
    http: HttpClient,
}

impl SimilarityClient {
    /// Create a client for the similarity service at `base_url`
    pub fn new(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key, base_url)?)
    }

    /// Client for the public similarity endpoint
    pub fn with_default_url(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_SIMILARITY_URL)
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

    /// Build from settings files and the `similarity` API key environment variable
    pub fn from_env() -> Result<Self> {
        Self::from_config(ConfigLoader::new()?.client_config(Service::Similarity)?)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // --- pages ---

    /// Index a new page
    pub async fn create_page(&self, page_id: i64, text: &str) -> Result<Value> {
        let body = NewPage {
            id_page: page_id,
            text,
        };
        self.http
            .post(&self.url("/api/pages"), &body, self.timeout())
            .await
    }

    /// All indexed pages
    pub async fn get_pages(&self) -> Result<Value> {
        self.http.get(&self.url("/api/pages"), self.timeout()).await
    }

    /// One page by id
    pub async fn get_page(&self, page_id: i64) -> Result<Value> {
        self.http
            .get(&self.url(&format!("/api/pages/{}", page_id)), self.timeout())
            .await
    }

    /// Replace a page's text
    pub async fn update_page(&self, page_id: i64, text: &str) -> Result<Value> {
        self.http
            .put(
                &self.url(&format!("/api/pages/{}", page_id)),
                &PageUpdate { text },
                self.timeout(),
            )
            .await
    }

    /// Remove a page from the index
    pub async fn delete_page(&self, page_id: i64) -> Result<()> {
        self.http
            .delete(&self.url(&format!("/api/pages/{}", page_id)), self.timeout())
            .await
    }

    // --- sites ---

    /// Register a site
    pub async fn create_site(&self, site_id: i64, fields: &SiteFields) -> Result<Value> {
        let body = NewSite {
            id_site: site_id,
            fields,
        };
        self.http
            .post(&self.url("/api/sites"), &body, self.timeout())
            .await
    }

    /// All registered sites
    pub async fn get_sites(&self) -> Result<Value> {
        self.http.get(&self.url("/api/sites"), self.timeout()).await
    }

    /// Change the given site attributes; unset ones are not sent
    pub async fn update_site(&self, site_id: i64, fields: &SiteFields) -> Result<Value> {
        self.http
            .put(
                &self.url(&format!("/api/sites/{}", site_id)),
                fields,
                self.timeout(),
            )
            .await
    }

    /// Remove a site
    pub async fn delete_site(&self, site_id: i64) -> Result<()> {
        self.http
            .delete(&self.url(&format!("/api/sites/{}", site_id)), self.timeout())
            .await
    }

    // --- articles ---

    /// Index a new article under `site_id`
    pub async fn create_article(&self, article_id: i64, site_id: i64, text: &str) -> Result<Value> {
        let body = NewArticle {
            id_article: article_id,
            id_site: site_id,
            text,
        };
        self.http
            .post(&self.url("/api/articles"), &body, self.timeout())
            .await
    }

    /// All articles, or only those of `site_id` when given
    pub async fn get_articles(&self, site_id: Option<i64>) -> Result<Value> {
        self.http
            .get(&self.articles_url(site_id), self.timeout())
            .await
    }

    /// Change the given article fields
    pub async fn update_article(&self, article_id: i64, update: &ArticleUpdate) -> Result<Value> {
        self.http
            .put(
                &self.url(&format!("/api/articles/{}", article_id)),
                update,
                self.timeout(),
            )
            .await
    }

    /// Remove an article from the index
    pub async fn delete_article(&self, article_id: i64) -> Result<()> {
        self.http
            .delete(
                &self.url(&format!("/api/articles/{}", article_id)),
                self.timeout(),
            )
            .await
    }

    // --- similarity ---

    /// Compare `text` against the indexed articles of a site
    pub async fn find_similar(
        &self,
        site_id: i64,
        article_snapshot_id: i64,
        text: &str,
    ) -> Result<Value> {
        let body = SimilarityQuery {
            id_site: site_id,
            id_article_snapshot: article_snapshot_id,
            text,
        };
        self.http
            .post(&self.url("/api/similarity"), &body, self.timeout())
            .await
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    fn articles_url(&self, site_id: Option<i64>) -> String {
        match site_id {
            Some(id) => self.url(&format!("/api/articles?idSite={}", id)),
            None => self.url("/api/articles"),
        }
    }

    fn timeout(&self) -> std::time::Duration {
        self.config.timeouts().request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AilabError;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    async fn setup() -> (ServerGuard, SimilarityClient) {
        let server = Server::new_async().await;
        let client = SimilarityClient::new("sim-key", server.url()).unwrap();
        (server, client)
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = SimilarityClient::with_default_url("").unwrap_err();
        assert!(matches!(err, AilabError::InvalidArgument(_)));
    }

    #[test]
    fn test_articles_url() {
        let client = SimilarityClient::new("k", "https://similarity.ailab.sh/").unwrap();
        assert_eq!(
            client.articles_url(None),
            "https://similarity.ailab.sh/api/articles"
        );
        assert_eq!(
            client.articles_url(Some(7)),
            "https://similarity.ailab.sh/api/articles?idSite=7"
        );
    }

    #[test]
    fn test_site_payload_omits_unset_fields() {
        let fields = SiteFields::default().with_name("Blog");
        let body = serde_json::to_value(NewSite {
            id_site: 3,
            fields: &fields,
        })
        .unwrap();
        assert_eq!(body, json!({"idSite": 3, "name": "Blog"}));
    }

    #[test]
    fn test_article_update_omits_unset_fields() {
        let body = serde_json::to_value(ArticleUpdate::default().with_text("new")).unwrap();
        assert_eq!(body, json!({"text": "new"}));

        let empty = serde_json::to_value(ArticleUpdate::default()).unwrap();
        assert_eq!(empty, json!({}));
    }

    #[tokio::test]
    async fn test_create_page() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/pages")
            .match_header("authorization", "Bearer sim-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"idPage": 12, "text": "hello"})))
            .with_status(201)
            .with_body(r#"{"idPage": 12, "text": "hello"}"#)
            .create_async()
            .await;

        let page = client.create_page(12, "hello").await.unwrap();

        mock.assert_async().await;
        assert_eq!(page["idPage"], 12);
    }

    #[tokio::test]
    async fn test_get_pages_and_page() {
        let (mut server, client) = setup().await;
        let list = server
            .mock("GET", "/api/pages")
            .with_status(200)
            .with_body(r#"[{"idPage": 1}, {"idPage": 2}]"#)
            .create_async()
            .await;
        let one = server
            .mock("GET", "/api/pages/2")
            .with_status(200)
            .with_body(r#"{"idPage": 2, "text": "two"}"#)
            .create_async()
            .await;

        let pages = client.get_pages().await.unwrap();
        let page = client.get_page(2).await.unwrap();

        list.assert_async().await;
        one.assert_async().await;
        assert_eq!(pages.as_array().map(|a| a.len()), Some(2));
        assert_eq!(page["text"], "two");
    }

    #[tokio::test]
    async fn test_update_and_delete_page() {
        let (mut server, client) = setup().await;
        let put = server
            .mock("PUT", "/api/pages/5")
            .match_body(Matcher::Json(json!({"text": "updated"})))
            .with_status(200)
            .with_body(r#"{"idPage": 5, "text": "updated"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/pages/5")
            .with_status(204)
            .create_async()
            .await;

        client.update_page(5, "updated").await.unwrap();
        client.delete_page(5).await.unwrap();

        put.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_site_crud() {
        let (mut server, client) = setup().await;
        let create = server
            .mock("POST", "/api/sites")
            .match_body(Matcher::Json(
                json!({"idSite": 9, "name": "News", "url": "https://news.example"}),
            ))
            .with_status(201)
            .with_body(r#"{"idSite": 9}"#)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/api/sites")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/api/sites/9")
            .match_body(Matcher::Json(json!({"url": "https://news2.example"})))
            .with_status(200)
            .with_body(r#"{"idSite": 9}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/sites/9")
            .with_status(200)
            .create_async()
            .await;

        let fields = SiteFields::default()
            .with_name("News")
            .with_url("https://news.example");
        client.create_site(9, &fields).await.unwrap();
        client.get_sites().await.unwrap();
        client
            .update_site(9, &SiteFields::default().with_url("https://news2.example"))
            .await
            .unwrap();
        client.delete_site(9).await.unwrap();

        create.assert_async().await;
        list.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_article_crud() {
        let (mut server, client) = setup().await;
        let create = server
            .mock("POST", "/api/articles")
            .match_body(Matcher::Json(
                json!({"idArticle": 40, "idSite": 9, "text": "body"}),
            ))
            .with_status(201)
            .with_body(r#"{"idArticle": 40}"#)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/api/articles/40")
            .match_body(Matcher::Json(json!({"idSite": 10})))
            .with_status(200)
            .with_body(r#"{"idArticle": 40, "idSite": 10}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/articles/40")
            .with_status(204)
            .create_async()
            .await;

        client.create_article(40, 9, "body").await.unwrap();
        let updated = client
            .update_article(40, &ArticleUpdate::default().with_site(10))
            .await
            .unwrap();
        client.delete_article(40).await.unwrap();

        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
        assert_eq!(updated["idSite"], 10);
    }

    #[tokio::test]
    async fn test_get_articles_with_site_filter() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/api/articles")
            .match_query(Matcher::UrlEncoded("idSite".into(), "7".into()))
            .with_status(200)
            .with_body(r#"[{"idArticle": 1, "idSite": 7}]"#)
            .create_async()
            .await;

        let articles = client.get_articles(Some(7)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(articles[0]["idSite"], 7);
    }

    #[tokio::test]
    async fn test_get_articles_without_filter() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/api/articles")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        client.get_articles(None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_similar() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/similarity")
            .match_body(Matcher::Json(json!({
                "idSite": 9,
                "idArticleSnapshot": 1001,
                "text": "draft text"
            })))
            .with_status(200)
            .with_body(r#"{"matches": [{"idArticle": 40, "similarity": 91.5}]}"#)
            .create_async()
            .await;

        let result = client.find_similar(9, 1001, "draft text").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["matches"][0]["idArticle"], 40);
    }

    #[tokio::test]
    async fn test_status_error_skips_body_decoding() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/api/pages/404")
            .with_status(404)
            .with_body("not json at all")
            .create_async()
            .await;

        let err = client.get_page(404).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_unparsable_success_body() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/api/sites")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let err = client.get_sites().await.unwrap_err();
        assert!(matches!(err, AilabError::Decode(_)));
    }
}
