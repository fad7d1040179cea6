//! Notion database client.

use std::time::Duration;

use async_trait::async_trait;
use awsdigest_shared::{DigestError, NotionConfig, Result, SecretSource};
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// Request timeout for knowledge-base calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The knowledge base a record is published into.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Id of an existing page whose URL property equals `url`.
    async fn find_by_url(&self, url: &str) -> Result<Option<String>>;

    /// Create a page and return its id. `children` holds at most 100 blocks.
    async fn create_page(&self, properties: Value, children: Vec<Value>) -> Result<String>;

    /// Append up to 100 blocks to an existing page.
    async fn append_children(&self, page_id: &str, children: Vec<Value>) -> Result<()>;
}

pub struct NotionClient {
    client: Client,
    base_url: String,
    version: String,
    api_key: String,
    database_id: String,
    url_property: String,
}

impl NotionClient {
    pub fn new(
        config: &NotionConfig,
        api_key: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            api_key: api_key.into(),
            database_id: database_id.into(),
            url_property: config.labels.url_property.clone(),
        })
    }

    /// Build a client with token and database id resolved through `secrets`.
    pub fn from_secrets(config: &NotionConfig, secrets: &dyn SecretSource) -> Result<Self> {
        let api_key = secrets.get(&config.api_key_secret)?;
        let database_id = secrets.get(&config.database_id_secret)?;
        Self::new(config, api_key, database_id)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let resp = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| DigestError::KnowledgeBase(format!("{what}: request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DigestError::KnowledgeBase(format!("{what}: body read failed: {e}")))?;

        if !status.is_success() {
            return Err(DigestError::KnowledgeBase(format!(
                "{what}: HTTP {}: {body}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| DigestError::KnowledgeBase(format!("{what}: malformed response: {e}")))
    }
}

#[async_trait]
impl KnowledgeBase for NotionClient {
    #[instrument(skip(self))]
    async fn find_by_url(&self, url: &str) -> Result<Option<String>> {
        let endpoint = format!("{}/v1/databases/{}/query", self.base_url, self.database_id);
        let body = json!({
            "filter": { "property": self.url_property, "url": { "equals": url } },
            "page_size": 1,
        });

        let json = self
            .send(self.client.post(&endpoint).json(&body), "database query")
            .await?;
        let id = json["results"][0]["id"].as_str().map(String::from);
        debug!(found = id.is_some(), "dedup lookup done");
        Ok(id)
    }

    #[instrument(skip_all, fields(children = children.len()))]
    async fn create_page(&self, properties: Value, children: Vec<Value>) -> Result<String> {
        let endpoint = format!("{}/v1/pages", self.base_url);
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties,
            "children": children,
        });

        let json = self
            .send(self.client.post(&endpoint).json(&body), "page create")
            .await?;
        json["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| DigestError::KnowledgeBase("page create: response without id".into()))
    }

    #[instrument(skip(self, children), fields(children = children.len()))]
    async fn append_children(&self, page_id: &str, children: Vec<Value>) -> Result<()> {
        let endpoint = format!("{}/v1/blocks/{page_id}/children", self.base_url);
        self.send(
            self.client
                .patch(&endpoint)
                .json(&json!({ "children": children })),
            "block append",
        )
        .await?;
        Ok(())
    }
}
