//! Three-point summaries of translated articles.

use std::sync::{Arc, LazyLock};

use awsdigest_llm::{ChatMessage, LanguageModel};
use awsdigest_shared::LanguageConfig;
use regex::Regex;
use tracing::{debug, instrument, warn};

/// Prefix of the text returned when summarization fails.
pub const SUMMARY_UNAVAILABLE: &str = "[summary unavailable]";

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    language: String,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, language: &LanguageConfig) -> Self {
        Self {
            model,
            language: language.target.clone(),
        }
    }

    /// Summarize `text` as `- ` prefixed lines; never fails.
    #[instrument(skip_all, fields(len = text.len()))]
    pub async fn summarize(&self, text: &str) -> String {
        let messages = vec![
            ChatMessage::system(format!(
                "You summarize {} text as the three most important bullet points.",
                self.language
            )),
            ChatMessage::user(format!(
                "Summarize the following text as exactly three concise bullet points, \
                 written in {}:\n\n{text}",
                self.language
            )),
        ];

        match self.model.complete(&messages).await {
            Ok(reply) => {
                let summary = normalize_bullets(&reply);
                debug!(lines = summary.lines().count(), "summary done");
                summary
            }
            Err(e) => {
                warn!(error = %e, "summary failed");
                format!("{SUMMARY_UNAVAILABLE} {e}")
            }
        }
    }
}

/// One `- item` line per non-blank reply line, whatever marker the model used.
///
/// `-`/`*` runs and numbers only count as markers when whitespace follows, so
/// `**bold**` and `3.5` stay intact. A lone bullet glyph such as `・` needs none.
pub fn normalize_bullets(reply: &str) -> String {
    static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:[-*•・●▪]+\s+|[•・●▪]\s*|\d+[.)）]\s+)").expect("valid regex")
    });

    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("- {}", MARKER_RE.replace(line, "").trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnModel;
    use awsdigest_shared::DigestError;

    #[test]
    fn normalizes_markers() {
        let reply = "• 一つ目\n\n- 二つ目\n* 三つ目";
        assert_eq!(normalize_bullets(reply), "- 一つ目\n- 二つ目\n- 三つ目");

        let numbered = "1. 新機能\n2) 全リージョン\n・料金変更なし";
        assert_eq!(
            normalize_bullets(numbered),
            "- 新機能\n- 全リージョン\n- 料金変更なし"
        );
    }

    #[test]
    fn content_that_looks_like_a_marker_is_kept() {
        let reply = "1. **新機能**: 高速化\n**料金**: 変更なし\n3.5 倍の性能向上";
        assert_eq!(
            normalize_bullets(reply),
            "- **新機能**: 高速化\n- **料金**: 変更なし\n- 3.5 倍の性能向上"
        );
        assert_eq!(normalize_bullets("-5% のコスト削減"), "- -5% のコスト削減");
        assert_eq!(normalize_bullets("** 強調なし"), "- 強調なし");
    }

    #[test]
    fn plain_lines_get_prefix() {
        assert_eq!(normalize_bullets("  要点  "), "- 要点");
        assert_eq!(normalize_bullets("   \n"), "");
    }

    #[tokio::test]
    async fn summary_is_normalized() {
        let model = FnModel::new(|_: &[ChatMessage]| Ok("- a\n- b\n- c".to_string()));
        let summarizer = Summarizer::new(model, &LanguageConfig::default());
        assert_eq!(summarizer.summarize("本文").await, "- a\n- b\n- c");
    }

    #[tokio::test]
    async fn failure_becomes_marker_text() {
        let model = FnModel::new(|_: &[ChatMessage]| {
            Err(DigestError::model_transient("API error [503]: overloaded"))
        });
        let summarizer = Summarizer::new(model, &LanguageConfig::default());
        let out = summarizer.summarize("本文").await;
        assert!(out.starts_with(SUMMARY_UNAVAILABLE));
        assert!(out.contains("overloaded"));
    }
}
