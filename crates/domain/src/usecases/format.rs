//! Formatting use case - renders an information record into post text

use crate::model::{InformationRecord, PostText};

/// Marker appended to truncated information
pub const ELLIPSIS: &str = "...";

/// Blank line between information and hashtags
const SEPARATOR: &str = "\n\n";

/// Default maximum post length in characters
pub const DEFAULT_MAX_LENGTH: usize = 150;

/// Formatter for turning records into publishable text
#[derive(Debug, Clone)]
pub struct PostFormatter {
    max_length: usize,
}

impl Default for PostFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl PostFormatter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Render a record as `information` + blank line + hashtag block,
    /// truncating the information so the whole fits `max_length`.
    ///
    /// Hashtags are only dropped (from the end) when the block alone leaves no
    /// room for the separator and an ellipsis.
    pub fn format(&self, record: &InformationRecord) -> PostText {
        let mut tags: Vec<String> = record
            .hashtags
            .iter()
            .filter_map(|t| normalize_hashtag(t))
            .collect();

        let candidate = compose(&record.information, &tags.join(" "));
        if char_len(&candidate) <= self.max_length {
            return PostText::new(candidate);
        }

        let overhead = SEPARATOR.len() + ELLIPSIS.len();
        while !tags.is_empty() && char_len(&tags.join(" ")) + overhead > self.max_length {
            let dropped = tags.pop();
            tracing::debug!(hashtag = ?dropped, max_length = self.max_length, "Dropping hashtag to fit");
        }
        let block = tags.join(" ");

        let candidate = compose(&record.information, &block);
        if char_len(&candidate) <= self.max_length {
            return PostText::new(candidate);
        }

        let reserved = if block.is_empty() {
            0
        } else {
            char_len(&block) + SEPARATOR.len()
        };
        let information = fit_with_ellipsis(&record.information, self.max_length - reserved);

        PostText::new(compose(&information, &block))
    }
}

/// Strip one leading `#` and all whitespace, then prefix `#`.
/// Returns None for tags left empty.
pub fn normalize_hashtag(tag: &str) -> Option<String> {
    let bare = tag.strip_prefix('#').unwrap_or(tag);
    let word: String = bare.chars().filter(|c| !c.is_whitespace()).collect();
    if word.is_empty() {
        None
    } else {
        Some(format!("#{}", word))
    }
}

/// Cut `text` to at most `max_len` characters, ending in an ellipsis when cut
pub fn fit_with_ellipsis(text: &str, max_len: usize) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }

    if max_len < ELLIPSIS.len() {
        return take_chars(text, max_len).to_string();
    }

    let kept = take_chars(text, max_len - ELLIPSIS.len()).trim_end();
    format!("{}{}", kept, ELLIPSIS)
}

fn compose(information: &str, block: &str) -> String {
    if block.is_empty() {
        information.to_string()
    } else {
        format!("{}{}{}", information, SEPARATOR, block)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
