//! Extraction use case - turns a raw generator reply into an information record
//!
//! Replies are asked for as JSON but models drift: code fences, trailing
//! commas, prose around the object. Extraction never fails; it degrades from
//! strict JSON to field patterns to the raw text itself.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::model::{Category, Extraction, InformationRecord, default_hashtags};

/// Characters of raw reply kept when nothing else is recognisable
pub const RAW_FALLBACK_CHARS: usize = 200;

static INFORMATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:"information"|information):\s*(?:"([^"]+)"|'([^']+)'|([^,\n]+))"#)
        .expect("information pattern is valid")
});

static HASHTAGS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:"hashtags"|hashtags):\s*\[(.*?)\]"#).expect("hashtags pattern is valid")
});

/// Extract an information record from a generator reply
pub fn extract(raw_reply: &str, category: &Category) -> Extraction {
    let cleaned = strip_code_fence(raw_reply);

    if let Some(record) = parse_structured(cleaned) {
        return Extraction::Structured(record);
    }

    tracing::debug!("Reply is not the expected JSON, trying field patterns");

    if let Some(record) = match_patterns(raw_reply) {
        return Extraction::PatternMatched(record);
    }

    tracing::debug!(category = %category, "No recognisable fields, using raw reply");
    Extraction::RawFallback(raw_fallback(raw_reply, category))
}

/// Strip markdown code fences (optionally labelled) around the reply
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();

    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let body = strip_fence_label(&trimmed[start + 3..]);

    match body.find("```") {
        Some(end) => body[..end].trim(),
        // Truncated reply with no closing fence
        None => body.trim(),
    }
}

/// Drop a language label right after an opening fence. `json` is dropped
/// wherever the body starts; other labels only when they end the fence line.
fn strip_fence_label(after_open: &str) -> &str {
    let label_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let (label, rest) = after_open.split_at(label_len);

    let ends_line = rest.is_empty() || rest.starts_with(['\n', '\r']);
    if label.eq_ignore_ascii_case("json") || ends_line {
        rest.trim_start()
    } else {
        after_open.trim_start()
    }
}

fn parse_structured(cleaned: &str) -> Option<InformationRecord> {
    let value: Value = serde_json::from_str(cleaned).ok()?;
    let object = value.as_object()?;

    let information = object.get("information")?.as_str()?.trim();
    if information.is_empty() {
        return None;
    }

    let hashtags = object
        .get("hashtags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(InformationRecord::new(information, hashtags))
}

fn match_patterns(reply: &str) -> Option<InformationRecord> {
    let captures = INFORMATION_PATTERN.captures(reply)?;

    let information = (1..=3)
        .filter_map(|i| captures.get(i))
        .map(|m| m.as_str().trim().trim_matches(|c: char| c == '"' || c == '\''))
        .find(|s| !s.is_empty())?;

    let hashtags = HASHTAGS_PATTERN
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|list| split_hashtag_list(list.as_str()))
        .unwrap_or_default();

    Some(InformationRecord::new(information, hashtags))
}

fn split_hashtag_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|tag| tag.trim().replace(['"', '\''], ""))
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn raw_fallback(reply: &str, category: &Category) -> InformationRecord {
    let information = if reply.trim().is_empty() {
        format!("Something beautiful about {}.", category)
    } else {
        reply.chars().take(RAW_FALLBACK_CHARS).collect()
    };

    let mut hashtags = default_hashtags();
    let category_tag = category.as_hashtag();
    if !category_tag.is_empty() {
        hashtags.push(category_tag);
    }

    InformationRecord {
        information,
        hashtags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractionKind;

    fn space() -> Category {
        Category::new("space facts")
    }

    #[test]
    fn test_extract_structured_json() {
        let reply = r#"{"information":"X","hashtags":["a","b"]}"#;

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::Structured);
        assert_eq!(
            extraction.into_record(),
            InformationRecord {
                information: "X".to_string(),
                hashtags: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_extract_json_in_code_block() {
        let reply = "```json\n{\"information\": \"Octopuses have three hearts.\", \"hashtags\": [\"ocean\"]}\n```";

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::Structured);
        assert_eq!(extraction.record().information, "Octopuses have three hearts.");
        assert_eq!(extraction.record().hashtags, vec!["ocean"]);
    }

    #[test]
    fn test_extract_json_on_labelled_fence_line() {
        let reply = "```json {\"information\": \"Light \\\"bends\\\" near stars\", \"hashtags\": [\"space\"]}\n```";

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::Structured);
        assert_eq!(extraction.record().information, r#"Light "bends" near stars"#);
        assert_eq!(extraction.record().hashtags, vec!["space"]);
    }

    #[test]
    fn test_extract_json_with_uppercase_label_glued_to_body() {
        let reply = "```JSON{\"information\": \"Bees dance to give directions.\"}```";

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::Structured);
        assert_eq!(
            extraction.record().information,
            "Bees dance to give directions."
        );
    }

    #[test]
    fn test_extract_json_in_unlabelled_fence_with_prose() {
        let reply = "Here you go:\n```\n{\"information\": \"Honey never spoils.\"}\n```\nEnjoy!";

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::Structured);
        assert_eq!(extraction.record().information, "Honey never spoils.");
    }

    #[test]
    fn test_extract_json_without_hashtags_uses_defaults() {
        let reply = r#"{"information": "Trees talk through fungi."}"#;

        let record = extract(reply, &space()).into_record();

        assert_eq!(record.hashtags, vec!["information", "facts", "inspiration"]);
    }

    #[test]
    fn test_extract_json_with_non_array_hashtags_uses_defaults() {
        let reply = r#"{"information": "Trees talk.", "hashtags": "trees, fungi"}"#;

        let record = extract(reply, &space()).into_record();

        assert_eq!(record.hashtags, vec!["information", "facts", "inspiration"]);
    }

    #[test]
    fn test_extract_pattern_fallback() {
        let reply = "information: Flamingos are pink, hashtags: [nature, facts]";

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::PatternMatched);
        let record = extraction.into_record();
        assert!(record.information.starts_with("Flamingos are pink"));
        assert_eq!(record.hashtags, vec!["nature", "facts"]);
    }

    #[test]
    fn test_extract_pattern_from_broken_json() {
        let reply = r#"{"information": "Venus spins backwards", "hashtags": ["space", 'venus',],}"#;

        let extraction = extract(reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::PatternMatched);
        let record = extraction.into_record();
        assert_eq!(record.information, "Venus spins backwards");
        assert_eq!(record.hashtags, vec!["space", "venus"]);
    }

    #[test]
    fn test_extract_pattern_is_case_insensitive() {
        let reply = "Information: 'Sloths can hold their breath longer than dolphins'";

        let record = extract(reply, &space()).into_record();

        assert_eq!(
            record.information,
            "Sloths can hold their breath longer than dolphins"
        );
        assert_eq!(record.hashtags, vec!["information", "facts", "inspiration"]);
    }

    #[test]
    fn test_extract_empty_json_information_falls_through() {
        let reply = r#"{"information": "", "hashtags": ["a"]}"#;

        let extraction = extract(reply, &space());

        assert_ne!(extraction.kind(), ExtractionKind::Structured);
        assert!(!extraction.record().information.is_empty());
    }

    #[test]
    fn test_extract_garbage_uses_raw_text() {
        let reply = "z".repeat(500);

        let extraction = extract(&reply, &space());

        assert_eq!(extraction.kind(), ExtractionKind::RawFallback);
        let record = extraction.into_record();
        assert_eq!(record.information, "z".repeat(200));
        assert_eq!(
            record.hashtags,
            vec!["information", "facts", "inspiration", "spacefacts"]
        );
    }

    #[test]
    fn test_extract_raw_fallback_keeps_leading_whitespace() {
        let record = extract("\n\n  zzzz", &space()).into_record();

        assert_eq!(record.information, "\n\n  zzzz");
    }

    #[test]
    fn test_extract_raw_fallback_counts_leading_whitespace() {
        let reply = format!("  {}", "z".repeat(300));

        let record = extract(&reply, &space()).into_record();

        assert_eq!(record.information, format!("  {}", "z".repeat(198)));
    }

    #[test]
    fn test_extract_raw_fallback_respects_char_boundaries() {
        let reply = "é".repeat(300);

        let record = extract(&reply, &space()).into_record();

        assert_eq!(record.information.chars().count(), 200);
    }

    #[test]
    fn test_extract_is_total() {
        let inputs = [
            "",
            "   \n\t ",
            "```",
            "```json",
            "null",
            "[]",
            "42",
            r#"{"hashtags": []}"#,
            "information:",
            "information: ,",
            "hashtags: [a, b]",
            "information: \"\"",
        ];

        for input in inputs {
            let record = extract(input, &space()).into_record();
            assert!(
                !record.information.trim().is_empty(),
                "empty information for {input:?}"
            );
            assert!(!record.hashtags.is_empty(), "no hashtags for {input:?}");
        }
    }

    #[test]
    fn test_strip_code_fence_raw() {
        let input = r#"{"information": "x"}"#;
        assert_eq!(strip_code_fence(input), input);
    }

    #[test]
    fn test_strip_code_fence_other_label_on_own_line() {
        let input = "```javascript\n{\"information\": \"x\"}\n```";
        assert_eq!(strip_code_fence(input), "{\"information\": \"x\"}");
    }

    #[test]
    fn test_strip_code_fence_unterminated() {
        let input = "```json\n{\"information\": \"x\"}";
        assert_eq!(strip_code_fence(input), "{\"information\": \"x\"}");
    }
}
