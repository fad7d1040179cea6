//! Application configuration for awsdigest.
//!
//! User config lives at `~/.awsdigest/awsdigest.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored here, only the *names* under which a
//! [`SecretSource`](crate::SecretSource) can resolve them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DigestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "awsdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".awsdigest";

// ---------------------------------------------------------------------------
// Config structs (matching awsdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Batch defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language model settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Knowledge base (Notion) settings.
    #[serde(default)]
    pub notion: NotionConfig,

    /// Service catalog store.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Retry policy for model calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Article fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Translation languages.
    #[serde(default)]
    pub language: LanguageConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum number of articles processed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Only feed entries newer than this many days are processed.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// What's-new RSS feed.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            lookback_days: default_lookback_days(),
            feed_url: default_feed_url(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_lookback_days() -> i64 {
    5
}
fn default_feed_url() -> String {
    "https://aws.amazon.com/about-aws/whats-new/recent/feed/".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Secret name holding the API key (never store the key itself).
    #[serde(default = "default_openai_key_secret")]
    pub api_key_secret: String,

    /// Chat model used for every task.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible API root (without `/chat/completions`).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_secret: default_openai_key_secret(),
            model: default_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_openai_key_secret() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model_timeout() -> u64 {
    120
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Secret name holding the integration token.
    #[serde(default = "default_notion_key_secret")]
    pub api_key_secret: String,

    /// Secret name holding the target database id.
    #[serde(default = "default_notion_db_secret")]
    pub database_id_secret: String,

    /// API root.
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,

    /// Value of the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub version: String,

    /// Property names and section headings used in created pages.
    #[serde(default)]
    pub labels: NotionLabels,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key_secret: default_notion_key_secret(),
            database_id_secret: default_notion_db_secret(),
            base_url: default_notion_base_url(),
            version: default_notion_version(),
            labels: NotionLabels::default(),
        }
    }
}

fn default_notion_key_secret() -> String {
    "NOTION_API_KEY".into()
}
fn default_notion_db_secret() -> String {
    "NOTION_DB_ID".into()
}
fn default_notion_base_url() -> String {
    "https://api.notion.com".into()
}
fn default_notion_version() -> String {
    "2022-06-28".into()
}

/// `[notion.labels]` section. Property names must match the database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionLabels {
    #[serde(default = "default_title_property")]
    pub title_property: String,
    #[serde(default = "default_url_property")]
    pub url_property: String,
    #[serde(default = "default_date_property")]
    pub date_property: String,
    #[serde(default = "default_tags_property")]
    pub tags_property: String,
    #[serde(default = "default_summary_heading")]
    pub summary_heading: String,
    #[serde(default = "default_body_heading")]
    pub body_heading: String,
    #[serde(default = "default_references_heading")]
    pub references_heading: String,
    #[serde(default = "default_original_heading")]
    pub original_heading: String,
}

impl Default for NotionLabels {
    fn default() -> Self {
        Self {
            title_property: default_title_property(),
            url_property: default_url_property(),
            date_property: default_date_property(),
            tags_property: default_tags_property(),
            summary_heading: default_summary_heading(),
            body_heading: default_body_heading(),
            references_heading: default_references_heading(),
            original_heading: default_original_heading(),
        }
    }
}

fn default_title_property() -> String {
    "タイトル".into()
}
fn default_url_property() -> String {
    "URL".into()
}
fn default_date_property() -> String {
    "公開日時".into()
}
fn default_tags_property() -> String {
    "タグ".into()
}
fn default_summary_heading() -> String {
    "要約".into()
}
fn default_body_heading() -> String {
    "内容".into()
}
fn default_references_heading() -> String {
    "参考".into()
}
fn default_original_heading() -> String {
    "原文".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// libSQL database file holding the `services` table.
    #[serde(default = "default_catalog_path")]
    pub db_path: String,

    /// Rows fetched per scan page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: default_catalog_path(),
            page_size: default_page_size(),
        }
    }
}

fn default_catalog_path() -> String {
    "~/.awsdigest/catalog.db".into()
}
fn default_page_size() -> u32 {
    100
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    4
}
fn default_max_backoff() -> u64 {
    10
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// CSS selector of the primary content container.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            content_selector: default_content_selector(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}
fn default_content_selector() -> String {
    "div#aws-page-content".into()
}

/// `[language]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "default_source_language")]
    pub source: String,
    #[serde(default = "default_target_language")]
    pub target: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            source: default_source_language(),
            target: default_target_language(),
        }
    }
}

fn default_source_language() -> String {
    "English".into()
}
fn default_target_language() -> String {
    "Japanese".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.awsdigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.awsdigest/awsdigest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DigestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DigestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DigestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DigestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl CatalogConfig {
    /// Resolve `db_path`, expanding a leading `~/` to the home directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir()
                    .ok_or_else(|| DigestError::config("could not determine home directory"))?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.db_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("feed_url"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("NOTION_DB_ID"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.concurrency, 5);
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.notion.labels.summary_heading, "要約");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[openai]
model = "gpt-4o-mini"

[retry]
max_backoff_secs = 30

[notion.labels]
summary_heading = "Summary"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.api_key_secret, "OPENAI_API_KEY");
        assert_eq!(config.retry.max_backoff(), Duration::from_secs(30));
        assert_eq!(config.retry.initial_backoff(), Duration::from_secs(4));
        assert_eq!(config.notion.labels.summary_heading, "Summary");
        assert_eq!(config.notion.labels.body_heading, "内容");
        assert_eq!(config.fetch.content_selector, "div#aws-page-content");
    }

    #[test]
    fn catalog_path_without_tilde_is_kept() {
        let catalog = CatalogConfig {
            db_path: "/tmp/catalog.db".into(),
            page_size: 10,
        };
        assert_eq!(
            catalog.resolved_db_path().unwrap(),
            PathBuf::from("/tmp/catalog.db")
        );
    }
}
