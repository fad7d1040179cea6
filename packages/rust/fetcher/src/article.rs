//! Article page fetching and body extraction.
//!
//! [`ArticleFetcher::fetch`] never returns an error: a network failure, a
//! non-2xx status or a page without the primary content container all
//! degrade to [`FetchedContent::unavailable`], and the pipeline carries on
//! with the placeholder.

use std::time::Duration;

use awsdigest_shared::{DigestError, FetchConfig, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use crate::USER_AGENT;

/// Body used when the article text could not be retrieved.
pub const CONTENT_UNAVAILABLE: &str = "content unavailable";

/// Maximum number of redirects to follow for an article URL.
const MAX_REDIRECTS: usize = 5;

/// Extracted article text and links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// Paragraph texts joined by blank lines, or [`CONTENT_UNAVAILABLE`].
    pub body: String,
    /// Absolute http(s) links inside the content container, document order.
    pub reference_links: Vec<String>,
    /// `false` when `body` is the placeholder.
    pub available: bool,
}

impl FetchedContent {
    pub fn unavailable() -> Self {
        Self {
            body: CONTENT_UNAVAILABLE.to_string(),
            reference_links: Vec::new(),
            available: false,
        }
    }
}

/// Fetches article pages and extracts the primary content container.
pub struct ArticleFetcher {
    client: Client,
    content_selector: Selector,
}

impl ArticleFetcher {
    /// Create a fetcher; fails only on an invalid selector or client setup.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))?;

        let content_selector = Selector::parse(&config.content_selector).map_err(|e| {
            DigestError::config(format!(
                "invalid content selector '{}': {e:?}",
                config.content_selector
            ))
        })?;

        Ok(Self {
            client,
            content_selector,
        })
    }

    /// Fetch `url` and extract its body. Degrades instead of failing.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchedContent {
        let html = match self.get_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "article fetch failed, using placeholder");
                return FetchedContent::unavailable();
            }
        };

        match extract_content(&html, &self.content_selector) {
            Some(content) => {
                debug!(
                    body_len = content.body.len(),
                    links = content.reference_links.len(),
                    "article content extracted"
                );
                content
            }
            None => {
                warn!("content container not found, using placeholder");
                FetchedContent::unavailable()
            }
        }
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| DigestError::Network(format!("{url}: body read failed: {e}")))
    }
}

/// Extract paragraph text and absolute links from the first element matching
/// `container`. `None` when the page has no such element.
///
/// Blank paragraphs are skipped so the body never contains runs of empty lines.
pub fn extract_content(html: &str, container: &Selector) -> Option<FetchedContent> {
    let doc = Html::parse_document(html);
    let root = doc.select(container).next()?;

    let p_sel = Selector::parse("p").expect("static selector");
    let a_sel = Selector::parse("a[href]").expect("static selector");

    let body = root
        .select(&p_sel)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let reference_links = root
        .select(&a_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
        .map(String::from)
        .collect();

    Some(FetchedContent {
        body,
        reference_links,
        available: true,
    })
}
