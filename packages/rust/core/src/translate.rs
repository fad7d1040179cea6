//! Article body translation.

use std::sync::{Arc, LazyLock};

use awsdigest_llm::{ChatMessage, LanguageModel};
use awsdigest_shared::LanguageConfig;
use regex::Regex;
use tracing::{debug, instrument, warn};

/// Prefix of the text returned when translation fails.
pub const TRANSLATION_ERROR: &str = "[translation error]";

pub struct Translator {
    model: Arc<dyn LanguageModel>,
    source: String,
    target: String,
}

impl Translator {
    pub fn new(model: Arc<dyn LanguageModel>, language: &LanguageConfig) -> Self {
        Self {
            model,
            source: language.source.clone(),
            target: language.target.clone(),
        }
    }

    /// Translate `text`; never fails. On error the returned text starts
    /// with [`TRANSLATION_ERROR`].
    #[instrument(skip_all, fields(len = text.len()))]
    pub async fn translate(&self, text: &str) -> String {
        let messages = vec![
            ChatMessage::system(format!(
                "You translate {} text into {}. Reply with the translation only.",
                self.source, self.target
            )),
            ChatMessage::user(format!(
                "Translate the following {} text into {}:\n\n{text}",
                self.source, self.target
            )),
        ];

        match self.model.complete(&messages).await {
            Ok(reply) => {
                let translated = strip_preamble(&reply);
                debug!(translated_len = translated.len(), "translation done");
                translated
            }
            Err(e) => {
                warn!(error = %e, "translation failed");
                format!("{TRANSLATION_ERROR} {e}")
            }
        }
    }
}

/// Longest first line still considered a possible preamble, in characters.
const PREAMBLE_MAX_CHARS: usize = 120;

/// Drop an introductory first line such as "Here is the translation:".
///
/// English intro phrases count anywhere in a short first line. Japanese lines
/// count only when they name the translation and end with a colon or are a
/// bare label like `日本語訳`. Single-line replies are kept whole.
pub fn strip_preamble(reply: &str) -> String {
    static INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)\b(?:here(?:\s+is|\s+are|['’]s)|below\s+is|the\s+following|translation|translated)\b|^(?:sure|certainly|of\s+course|okay|ok)\b",
        )
        .expect("valid regex")
    });
    static JA_LABEL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"翻訳|日本語訳").expect("valid regex"));

    let reply = reply.trim();
    let Some((first, rest)) = reply.split_once('\n') else {
        return reply.to_string();
    };

    let first = first.trim();
    if rest.trim().is_empty() || first.chars().count() > PREAMBLE_MAX_CHARS {
        return reply.to_string();
    }

    let ends_with_colon = first.ends_with(':') || first.ends_with('：');
    let bare_label = first
        .trim_matches(|c: char| c.is_ascii_punctuation() || "【】「」：".contains(c))
        .trim();
    let looks_intro = INTRO_RE.is_match(first)
        || (JA_LABEL_RE.is_match(first)
            && (ends_with_colon || matches!(bare_label, "翻訳" | "日本語訳" | "翻訳文" | "翻訳結果")));

    if looks_intro {
        rest.trim().to_string()
    } else {
        reply.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FnModel, user_text};
    use awsdigest_shared::DigestError;

    fn translator(model: Arc<dyn LanguageModel>) -> Translator {
        Translator::new(model, &LanguageConfig::default())
    }

    #[test]
    fn drops_intro_line() {
        let reply = "Here is the translation:\nAmazon EC2 で新しいインスタンスが利用可能になりました。";
        assert_eq!(
            strip_preamble(reply),
            "Amazon EC2 で新しいインスタンスが利用可能になりました。"
        );
        assert_eq!(strip_preamble("以下が翻訳です：\n本文\n\n続き"), "本文\n\n続き");
        assert_eq!(strip_preamble("Sure!\n本文"), "本文");
    }

    #[test]
    fn drops_intro_phrases_anywhere_in_first_line() {
        assert_eq!(strip_preamble("Here’s the Japanese translation:\n本文"), "本文");
        assert_eq!(strip_preamble("Okay, here is the translation.\n本文"), "本文");
        assert_eq!(strip_preamble("Translated text\n本文"), "本文");
        assert_eq!(strip_preamble("日本語訳\n本文"), "本文");
        assert_eq!(strip_preamble("【翻訳結果】\n本文"), "本文");
    }

    #[test]
    fn keeps_translated_lead_sentence_ending_in_colon() {
        let reply = "新機能は次のとおりです：\n- 高速化\n- 低価格";
        assert_eq!(strip_preamble(reply), reply);

        let about_translate = "Amazon Translate が 5 つの言語を追加しました。\n詳細はこちら。";
        assert_eq!(strip_preamble(about_translate), about_translate);
    }

    #[test]
    fn keeps_single_line_and_plain_multiline() {
        assert_eq!(strip_preamble("本文のみ"), "本文のみ");
        assert_eq!(strip_preamble("第一段落。\n第二段落。"), "第一段落。\n第二段落。");
        assert_eq!(strip_preamble("Here is:\n   "), "Here is:");
    }

    #[tokio::test]
    async fn translation_uses_configured_languages() {
        let model = FnModel::new(|_: &[ChatMessage]| {
            Ok("Here is the translation:\n本文です。".to_string())
        });
        let out = translator(model.clone()).translate("Body text.").await;
        assert_eq!(out, "本文です。");

        let calls = model.calls();
        assert!(user_text(&calls[0]).contains("English text into Japanese"));
        assert!(user_text(&calls[0]).ends_with("Body text."));
    }

    #[tokio::test]
    async fn failure_becomes_error_text() {
        let model = FnModel::new(|_: &[ChatMessage]| Err(DigestError::model("empty reply")));
        let out = translator(model).translate("Body").await;
        assert!(out.starts_with(TRANSLATION_ERROR));
        assert!(out.contains("empty reply"));
    }
}
