//! HTTP retrieval for the pipeline's inputs.
//!
//! This crate provides:
//! - [`article`]: article page fetch and main-body extraction (never fails)
//! - [`feed`]: the what's-new RSS feed reader

pub mod article;
pub mod feed;

pub use article::{ArticleFetcher, CONTENT_UNAVAILABLE, FetchedContent, extract_content};
pub use feed::{FeedEntry, FeedReader, parse_feed, recent_articles};

/// User-Agent string for outgoing requests.
pub(crate) const USER_AGENT: &str = concat!("awsdigest/", env!("CARGO_PKG_VERSION"));
