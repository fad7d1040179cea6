//! Idempotent publishing of enriched articles into the knowledge base.
//!
//! [`Publisher::publish`] looks the record's URL up first and only creates a
//! page when none exists. Pages are never updated once created.

pub mod blocks;
pub mod notion;

use std::sync::Arc;

use awsdigest_shared::{KnowledgeBaseRecord, NotionLabels};
use chrono::Utc;
use tracing::{error, info, instrument};

pub use blocks::{build_children, build_properties, chunk_words, normalize_published};
pub use notion::{KnowledgeBase, NotionClient};

/// Block limit of a single create or append request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// A page that exists in the knowledge base for the published record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub page_id: String,
    /// Set when the page was created but some of its blocks were not appended.
    pub incomplete: Option<String>,
}

impl Publication {
    fn complete(page_id: String) -> Self {
        Self {
            page_id,
            incomplete: None,
        }
    }
}

pub struct Publisher {
    kb: Arc<dyn KnowledgeBase>,
    labels: NotionLabels,
}

impl Publisher {
    pub fn new(kb: Arc<dyn KnowledgeBase>, labels: NotionLabels) -> Self {
        Self { kb, labels }
    }

    /// Publish `record` and return its page, or `None` on failure.
    ///
    /// An existing page with the same URL is returned as-is. A failed lookup
    /// counts as a failure so that an unreachable knowledge base never leads
    /// to a blind create. A page whose overflow blocks could not all be
    /// appended is returned with [`Publication::incomplete`] set.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn publish(&self, record: &KnowledgeBaseRecord) -> Option<Publication> {
        match self.kb.find_by_url(&record.url).await {
            Ok(Some(page_id)) => {
                info!(%page_id, "already published");
                return Some(Publication::complete(page_id));
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "dedup lookup failed, skipping create");
                return None;
            }
        }

        let properties = build_properties(record, &self.labels, Utc::now());
        let mut children = build_children(record, &self.labels);
        let overflow = if children.len() > MAX_CHILDREN_PER_REQUEST {
            children.split_off(MAX_CHILDREN_PER_REQUEST)
        } else {
            Vec::new()
        };

        let page_id = match self.kb.create_page(properties, children).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "page create failed");
                return None;
            }
        };

        let mut appended = 0;
        for batch in overflow.chunks(MAX_CHILDREN_PER_REQUEST) {
            if let Err(e) = self.kb.append_children(&page_id, batch.to_vec()).await {
                let missing = overflow.len() - appended;
                // Later runs find the page by URL and will not repair it.
                error!(%page_id, missing, error = %e, "page left incomplete");
                return Some(Publication {
                    page_id,
                    incomplete: Some(format!(
                        "page created but {missing} of {} blocks were not appended: {e}",
                        overflow.len() + MAX_CHILDREN_PER_REQUEST
                    )),
                });
            }
            appended += batch.len();
        }

        info!(%page_id, "published");
        Some(Publication::complete(page_id))
    }
}
