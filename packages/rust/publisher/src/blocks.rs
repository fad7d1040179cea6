//! Page properties and content blocks for a knowledge-base record.

use awsdigest_shared::{KnowledgeBaseRecord, NotionLabels};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};

/// Maximum characters in one rich-text object.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Words are separated by whitespace and rejoined with single spaces. A word
/// is only ever split when it alone exceeds `max_chars`.
pub fn chunk_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces: Vec<String> = chars
                .chunks(max_chars)
                .map(|piece| piece.iter().collect())
                .collect();
            // The tail may still share a chunk with the following words.
            if let Some(tail) = pieces.pop() {
                chunks.extend(pieces);
                current_len = tail.chars().count();
                current = tail;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Publish date as RFC 3339 with an explicit offset.
///
/// Accepts RFC 3339 or a naive ISO-8601 date/datetime (taken as UTC); anything
/// else, including a missing value, falls back to `now`.
pub fn normalize_published(raw: Option<&str>, now: DateTime<Utc>) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_timestamp)
        .unwrap_or_else(|| now.fixed_offset())
        .to_rfc3339()
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": truncate_chars(content, MAX_TEXT_CHARS) } }])
}

fn block(kind: &str, content: &str) -> Value {
    let mut block = json!({ "object": "block", "type": kind });
    block[kind] = json!({ "rich_text": rich_text(content) });
    block
}

pub fn heading(text: &str) -> Value {
    block("heading_2", text)
}

pub fn paragraph(text: &str) -> Value {
    block("paragraph", text)
}

pub fn bullet(text: &str) -> Value {
    block("bulleted_list_item", text)
}

/// Database properties: title, URL, date and (only when tagged) tags.
pub fn build_properties(
    record: &KnowledgeBaseRecord,
    labels: &NotionLabels,
    now: DateTime<Utc>,
) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        labels.title_property.clone(),
        json!({ "title": [{ "text": { "content": truncate_chars(&record.title, MAX_TEXT_CHARS) } }] }),
    );
    properties.insert(labels.url_property.clone(), json!({ "url": record.url }));
    properties.insert(
        labels.date_property.clone(),
        json!({ "date": { "start": normalize_published(record.published.as_deref(), now) } }),
    );
    if let Some(tag) = &record.tag {
        properties.insert(
            labels.tags_property.clone(),
            json!({ "multi_select": [{ "name": tag.as_str() }] }),
        );
    }
    Value::Object(properties)
}

/// Page body: summary, translated body, references, original body.
pub fn build_children(record: &KnowledgeBaseRecord, labels: &NotionLabels) -> Vec<Value> {
    let mut children = vec![heading(&labels.summary_heading)];
    children.extend(
        record
            .summary
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| bullet(line.trim_start_matches(['-', ' ']))),
    );

    children.push(heading(&labels.body_heading));
    children.extend(
        chunk_words(&record.translated_body, MAX_TEXT_CHARS)
            .iter()
            .map(|chunk| paragraph(chunk)),
    );

    children.push(heading(&labels.references_heading));
    children.extend(record.reference_links.iter().map(|link| bullet(link)));

    children.push(heading(&labels.original_heading));
    children.extend(
        chunk_words(&record.original_body, MAX_TEXT_CHARS)
            .iter()
            .map(|chunk| paragraph(chunk)),
    );

    children
}
