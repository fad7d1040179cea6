//! Shared types, error model, and configuration for awsdigest.
//!
//! This crate is the foundation depended on by all other awsdigest crates.
//! It provides:
//! - [`DigestError`]: the unified error type
//! - Domain types ([`FeedArticle`], [`ArticleContent`], [`KnowledgeBaseRecord`], [`Tag`])
//! - Configuration ([`AppConfig`], config loading)
//! - Secret lookup ([`SecretSource`])

pub mod config;
pub mod error;
pub mod secrets;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, DefaultsConfig, FetchConfig, LanguageConfig, NotionConfig,
    NotionLabels, OpenAiConfig, RetryConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DigestError, Result};
pub use secrets::{EnvSecrets, SecretSource, StaticSecrets};
pub use types::{
    ArticleContent, ArticleOutcome, FeedArticle, KnowledgeBaseRecord, ServiceCatalogEntry, Tag,
};
