//! Article enrichment pipeline for AWS what's-new announcements.
//!
//! This crate ties the catalog, fetcher, language model and publisher
//! together: [`Pipeline`] enriches one article end to end and
//! [`run_batch`] fans it out over many.

pub mod batch;
pub mod classify;
pub mod pipeline;
pub mod summarize;
pub mod translate;

#[cfg(test)]
mod testing;

pub use batch::{BatchProgress, BatchReport, SilentProgress, run_batch};
pub use classify::Classifier;
pub use pipeline::{ArticleProcessor, Pipeline};
pub use summarize::Summarizer;
pub use translate::Translator;
