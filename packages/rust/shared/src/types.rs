//! Core domain types for the article enrichment pipeline.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ServiceCatalogEntry
// ---------------------------------------------------------------------------

/// One row of the service catalog: full service name → abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    /// Unique key, e.g. `"AWS Identity and Access Management"`.
    pub full_name: String,
    /// Never empty. May equal `full_name` for services without a short form.
    pub abbreviation: String,
}

// ---------------------------------------------------------------------------
// FeedArticle
// ---------------------------------------------------------------------------

/// A single announcement handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedArticle {
    pub title: String,
    /// Canonical URL; also the dedup key in the knowledge base.
    pub link: String,
    /// ISO-8601 publish timestamp as received from the feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// The service label assigned to an article. An article carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ArticleContent
// ---------------------------------------------------------------------------

/// Everything derived from the article page. Lives only until publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleContent {
    pub original_body: String,
    pub translated_body: String,
    pub summary: String,
    /// Absolute links found in the body, document order, duplicates kept.
    pub reference_links: Vec<String>,
}

// ---------------------------------------------------------------------------
// KnowledgeBaseRecord
// ---------------------------------------------------------------------------

/// The structured document written to the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseRecord {
    pub title: String,
    pub url: String,
    /// Raw publish timestamp; normalized by the publisher.
    pub published: Option<String>,
    pub tag: Option<Tag>,
    pub summary: String,
    pub translated_body: String,
    pub original_body: String,
    pub reference_links: Vec<String>,
}

impl KnowledgeBaseRecord {
    /// Assemble a record from the feed entry, its tag and the derived content.
    pub fn new(article: &FeedArticle, tag: Option<Tag>, content: ArticleContent) -> Self {
        Self {
            title: article.title.clone(),
            url: article.link.clone(),
            published: article.published.clone(),
            tag,
            summary: content.summary,
            translated_body: content.translated_body,
            original_body: content.original_body,
            reference_links: content.reference_links,
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleOutcome
// ---------------------------------------------------------------------------

/// Per-article result reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleOutcome {
    pub title: String,
    /// Zero or one entry.
    pub tags: Vec<String>,
    pub published_to_kb: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Detail for failures caught at the article boundary, or why a
    /// published page is incomplete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleOutcome {
    /// Outcome of a run that reached the publish step.
    pub fn published(title: impl Into<String>, tag: Option<&Tag>, document_id: Option<String>) -> Self {
        Self {
            title: title.into(),
            tags: tag.iter().map(|t| t.0.clone()).collect(),
            published_to_kb: document_id.is_some(),
            document_id,
            error: None,
        }
    }

    /// Outcome of a run aborted by an unexpected fault.
    pub fn failed(title: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            published_to_kb: false,
            document_id: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.published_to_kb && self.error.is_none()
    }
}
