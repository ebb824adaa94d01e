//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Hashtags used when the generator gives none we can use
pub const DEFAULT_HASHTAGS: [&str; 3] = ["information", "facts", "inspiration"];

/// Topics the generator is steered towards, one picked per cycle
pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "motivational quotes",
    "nature facts",
    "space facts",
    "historical facts",
    "inspirational quotes",
    "mindfulness facts",
    "philosophical insights",
    "positive affirmations",
    "scientific discoveries",
    "humanity achievements",
];

/// Pre-written posts published when generation fails
pub const FALLBACK_POSTS: [&str; 3] = [
    "Did you know? A group of flamingos is called a 'flamboyance'! #nature #facts #animals",
    "The Eiffel Tower can be 15 cm taller during the summer due to the expansion of iron in the heat! #science #historicalfacts #inspiration",
    "Space is completely silent because there's no air for sound waves to travel through. #space #science #facts",
];

/// A topic label steering one generation request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category name with all whitespace removed, usable as a hashtag
    pub fn as_hashtag(&self) -> String {
        self.0.chars().filter(|c| !c.is_whitespace()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured content pulled out of a generator reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationRecord {
    /// Free text body of the post
    pub information: String,
    /// Plain words, no leading `#`
    pub hashtags: Vec<String>,
}

impl InformationRecord {
    /// Create a record, substituting the default hashtags for an empty list
    pub fn new(information: impl Into<String>, hashtags: Vec<String>) -> Self {
        let hashtags = if hashtags.is_empty() {
            default_hashtags()
        } else {
            hashtags
        };

        Self {
            information: information.into(),
            hashtags,
        }
    }
}

/// The default hashtag list as owned strings
pub fn default_hashtags() -> Vec<String> {
    DEFAULT_HASHTAGS.iter().map(|t| t.to_string()).collect()
}

/// How a generator reply was turned into an [`InformationRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The reply parsed as the requested JSON object
    Structured(InformationRecord),
    /// Fields were recovered from loosely formatted text
    PatternMatched(InformationRecord),
    /// Nothing recognisable; the raw text was used as-is
    RawFallback(InformationRecord),
}

impl Extraction {
    pub fn record(&self) -> &InformationRecord {
        match self {
            Self::Structured(r) | Self::PatternMatched(r) | Self::RawFallback(r) => r,
        }
    }

    pub fn into_record(self) -> InformationRecord {
        match self {
            Self::Structured(r) | Self::PatternMatched(r) | Self::RawFallback(r) => r,
        }
    }

    pub fn kind(&self) -> ExtractionKind {
        match self {
            Self::Structured(_) => ExtractionKind::Structured,
            Self::PatternMatched(_) => ExtractionKind::PatternMatched,
            Self::RawFallback(_) => ExtractionKind::RawFallback,
        }
    }
}

/// Discriminant of [`Extraction`] without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    Structured,
    PatternMatched,
    RawFallback,
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Structured => "structured",
            Self::PatternMatched => "pattern_matched",
            Self::RawFallback => "raw_fallback",
        };
        f.write_str(name)
    }
}

/// Final text handed to a publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostText(String);

impl PostText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, the unit every budget in this crate uses
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PostText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a post's text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOrigin {
    Generated {
        category: Category,
        extraction: ExtractionKind,
    },
    Fallback {
        reason: String,
    },
}

impl PostOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Output of one content generation
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub text: PostText,
    pub origin: PostOrigin,
}

/// Identifiers the posting service hands back for a created post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// AT URI of the created record
    pub uri: String,
    /// Content identifier of the record
    pub cid: String,
}

/// Summary of one generate → publish cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Sequence number, starting at 1
    pub cycle: u64,
    /// Correlation id for the cycle's log lines
    pub run_id: Uuid,
    pub text: PostText,
    pub origin: PostOrigin,
    /// None when publishing failed or was skipped
    pub receipt: Option<PostReceipt>,
    pub dry_run: bool,
}

impl CycleReport {
    pub fn published(&self) -> bool {
        self.receipt.is_some()
    }
}
