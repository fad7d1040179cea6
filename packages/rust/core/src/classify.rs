//! Single-label service tagging.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use awsdigest_catalog::CatalogSnapshot;
use awsdigest_llm::{ChatMessage, LanguageModel};
use awsdigest_shared::Tag;
use tracing::{debug, instrument, warn};

/// The model's answer when no candidate fits.
pub const NOT_FOUND: &str = "Not Found";

/// Characters of article body shown to the model.
pub const EXCERPT_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You tag AWS announcements with the single AWS service they are about.";

pub struct Classifier {
    model: Arc<dyn LanguageModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Pick at most one catalog name for the article. Any failure, an
    /// unmatched answer or [`NOT_FOUND`] yields `None`.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn classify(
        &self,
        title: &str,
        body_excerpt: &str,
        catalog: &CatalogSnapshot,
    ) -> Option<Tag> {
        if catalog.is_empty() {
            warn!("service catalog is empty, skipping classification");
            return None;
        }

        let messages = build_messages(title, body_excerpt, catalog);
        let answer = match self.model.complete(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "classification failed");
                return None;
            }
        };

        let tag = match_answer(&answer, catalog);
        debug!(answer = %answer, tag = ?tag, "classification done");
        tag
    }
}

/// Every catalog name exactly once, grouped under its abbreviation.
///
/// `Amazon EC2 (Amazon Elastic Compute Cloud, ...)` when full names differ
/// from the abbreviation, the bare name otherwise.
pub fn candidate_list(catalog: &CatalogSnapshot) -> Vec<String> {
    let heads: BTreeSet<&str> = catalog.abbreviations.values().map(String::as_str).collect();

    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (full, abbr) in &catalog.abbreviations {
        let members = groups.entry(abbr.as_str()).or_default();
        if full != abbr && !heads.contains(full.as_str()) {
            members.push(full.as_str());
        }
    }

    let mut lines: Vec<String> = groups
        .into_iter()
        .map(|(abbr, members)| {
            if members.is_empty() {
                abbr.to_string()
            } else {
                format!("{abbr} ({})", members.join(", "))
            }
        })
        .collect();

    // Names present without a catalog row of their own.
    let listed: BTreeSet<&str> = catalog
        .abbreviations
        .iter()
        .flat_map(|(full, abbr)| [full.as_str(), abbr.as_str()])
        .collect();
    lines.extend(
        catalog
            .names
            .iter()
            .filter(|name| !listed.contains(name.as_str()))
            .cloned(),
    );
    lines
}

pub fn build_messages(title: &str, body_excerpt: &str, catalog: &CatalogSnapshot) -> Vec<ChatMessage> {
    let excerpt = truncate_chars(body_excerpt.trim(), EXCERPT_CHARS);
    let candidates = candidate_list(catalog).join("\n");

    let prompt = format!(
        "Identify the AWS service this announcement is about.\n\
         Rules:\n\
         1. Answer with exactly one name copied from the candidate list, preferring the \
            abbreviation (the name outside the parentheses).\n\
         2. If several services are mentioned, answer with the most relevant one.\n\
         3. A feature of a service is tagged with the service itself.\n\
         4. If the article is about no specific service (a program, a region launch, \
            a general AWS feature), answer {NOT_FOUND}.\n\
         5. Output only the name or {NOT_FOUND}, nothing else.\n\n\
         Candidates:\n{candidates}\n\n\
         Title: {title}\n\n\
         Excerpt:\n{excerpt}\n\n\
         Answer:"
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}

/// Validate the model's answer against the catalog.
pub fn match_answer(answer: &str, catalog: &CatalogSnapshot) -> Option<Tag> {
    let answer = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim();

    if answer.is_empty() || answer.eq_ignore_ascii_case(NOT_FOUND) {
        return None;
    }
    if catalog.contains(answer) {
        return Some(Tag(answer.to_string()));
    }
    catalog
        .find_ignore_case(answer)
        .map(|name| Tag(name.to_string()))
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
