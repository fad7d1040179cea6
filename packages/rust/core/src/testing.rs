//! In-crate fakes for the pipeline's collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use awsdigest_catalog::{CatalogPage, CatalogSnapshot, CatalogStore};
use awsdigest_llm::{ChatMessage, LanguageModel};
use awsdigest_publisher::KnowledgeBase;
use awsdigest_shared::{DigestError, Result, ServiceCatalogEntry};
use serde_json::Value;

/// Model whose replies come from a closure over the request.
pub struct FnModel<F> {
    reply: F,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl<F> FnModel<F>
where
    F: Fn(&[ChatMessage]) -> Result<String> + Send + Sync,
{
    pub fn new(reply: F) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&[ChatMessage]) -> Result<String> + Send + Sync,
{
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        (self.reply)(messages)
    }
}

/// Text of the last (user) message.
pub fn user_text(messages: &[ChatMessage]) -> &str {
    messages.last().map(|m| m.content.as_str()).unwrap_or("")
}

pub fn entries(pairs: &[(&str, &str)]) -> Vec<ServiceCatalogEntry> {
    pairs
        .iter()
        .map(|(full, abbr)| ServiceCatalogEntry {
            full_name: full.to_string(),
            abbreviation: abbr.to_string(),
        })
        .collect()
}

pub fn snapshot(pairs: &[(&str, &str)]) -> CatalogSnapshot {
    CatalogSnapshot::from_entries(entries(pairs))
}

/// Catalog rows held in memory, scanned in key order.
pub struct MemoryCatalog {
    rows: Vec<ServiceCatalogEntry>,
    fail: bool,
}

impl MemoryCatalog {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        let mut rows = entries(pairs);
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Arc::new(Self { rows, fail: false })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn scan(&self, after: Option<&str>, limit: u32) -> Result<CatalogPage> {
        if self.fail {
            return Err(DigestError::Storage("catalog store unreachable".into()));
        }
        let page: Vec<ServiceCatalogEntry> = self
            .rows
            .iter()
            .filter(|row| after.is_none_or(|key| row.full_name.as_str() > key))
            .take(limit as usize)
            .cloned()
            .collect();
        let last_key = (page.len() == limit as usize)
            .then(|| page.last().map(|row| row.full_name.clone()))
            .flatten();
        Ok(CatalogPage {
            entries: page,
            last_key,
        })
    }

    async fn upsert(&self, _entry: &ServiceCatalogEntry) -> Result<()> {
        Err(DigestError::Storage("read-only fake".into()))
    }
}

/// Knowledge base keyed by the `URL` property.
#[derive(Default)]
pub struct MemoryKb {
    pub pages: Mutex<HashMap<String, String>>,
    pub created: Mutex<Vec<Value>>,
    pub fail_appends: bool,
}

#[async_trait]
impl KnowledgeBase for MemoryKb {
    async fn find_by_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self.pages.lock().unwrap().get(url).cloned())
    }

    async fn create_page(&self, properties: Value, _children: Vec<Value>) -> Result<String> {
        let url = properties["URL"]["url"].as_str().unwrap_or_default().to_string();
        let mut created = self.created.lock().unwrap();
        created.push(properties);
        let id = format!("page-{}", created.len());
        self.pages.lock().unwrap().insert(url, id.clone());
        Ok(id)
    }

    async fn append_children(&self, _page_id: &str, _children: Vec<Value>) -> Result<()> {
        if self.fail_appends {
            return Err(DigestError::KnowledgeBase("HTTP 502: bad gateway".into()));
        }
        Ok(())
    }
}
