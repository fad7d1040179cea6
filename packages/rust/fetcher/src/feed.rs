//! What's-new RSS feed reader.

use std::time::Duration;

use awsdigest_shared::{DigestError, FeedArticle, Result};
use chrono::{DateTime, TimeDelta, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::USER_AGENT;

/// One `<item>` of the feed, before date filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Raw RFC 2822 `pubDate`.
    pub pub_date: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
}

/// Parse RSS 2.0 XML into entries. Channel-level `title`/`link` are ignored.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => current = Some(FeedEntry::default()),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" if current.is_some() => field = Some(Field::Link),
                b"pubDate" if current.is_some() => field = Some(Field::PubDate),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = e
                        .unescape()
                        .map_err(|e| DigestError::parse(format!("feed text: {e}")))?;
                    push_text(entry, f, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    push_text(entry, f, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => {
                    if let Some(entry) = current.take() {
                        if entry.link.is_empty() {
                            warn!(title = %entry.title, "feed item without link skipped");
                        } else {
                            entries.push(entry);
                        }
                    }
                    field = None;
                }
                b"title" | b"link" | b"pubDate" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DigestError::parse(format!(
                    "feed XML error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn push_text(entry: &mut FeedEntry, field: Field, text: &str) {
    match field {
        Field::Title => entry.title.push_str(text),
        Field::Link => entry.link.push_str(text.trim()),
        Field::PubDate => entry
            .pub_date
            .get_or_insert_with(String::new)
            .push_str(text.trim()),
    }
}

/// Keep entries published within `lookback` of `now`, converted to
/// [`FeedArticle`] with an RFC 3339 UTC timestamp. Entries without a
/// parseable `pubDate` are dropped.
pub fn recent_articles(
    entries: Vec<FeedEntry>,
    now: DateTime<Utc>,
    lookback: TimeDelta,
) -> Vec<FeedArticle> {
    let cutoff = now - lookback;

    entries
        .into_iter()
        .filter_map(|entry| {
            let raw = entry.pub_date.as_deref()?;
            let published = match DateTime::parse_from_rfc2822(raw) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    debug!(link = %entry.link, pub_date = raw, error = %e, "unparseable pubDate");
                    return None;
                }
            };
            (published >= cutoff).then(|| FeedArticle {
                title: entry.title.trim().to_string(),
                link: entry.link,
                published: Some(published.to_rfc3339()),
            })
        })
        .collect()
}

/// Downloads the feed and selects recent announcements.
pub struct FeedReader {
    client: Client,
    url: String,
}

impl FeedReader {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Articles published within the last `lookback_days` days.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_recent(&self, lookback_days: i64) -> Result<Vec<FeedArticle>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DigestError::Network(format!("feed request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::Network(format!("feed returned HTTP {status}")));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| DigestError::Network(format!("feed body read failed: {e}")))?;

        let entries = parse_feed(&xml)?;
        let total = entries.len();
        let articles = recent_articles(entries, Utc::now(), TimeDelta::days(lookback_days));

        info!(total, recent = articles.len(), "feed parsed");
        Ok(articles)
    }
}
