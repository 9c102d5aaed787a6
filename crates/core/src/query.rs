//! Turn inputs: the user query and the passages retrieved for it.

use serde::{Deserialize, Serialize};

/// An immutable user query for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The natural-language text
    pub text: String,

    /// Free-form per-turn options (e.g. `top_k`)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Requested retrieval depth, if the caller set one.
    pub fn top_k(&self) -> Option<usize> {
        self.metadata
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map(|k| k as usize)
    }
}

/// A scored text snippet returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Identifier of the source document
    pub doc_id: String,

    /// The snippet text
    pub text: String,

    /// Relevance in [0, 1]
    pub score: f32,
}

impl Passage {
    pub fn new(doc_id: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// Sort passages by descending score and keep at most `k`.
pub fn rank_passages(mut passages: Vec<Passage>, k: usize) -> Vec<Passage> {
    passages.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    passages.truncate(k);
    passages
}

/// Words too common to say anything about a query's subject.
const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "does", "find", "from", "have", "into", "like", "more",
    "much", "show", "some", "tell", "than", "that", "their", "them", "then", "there", "these",
    "they", "this", "what", "when", "where", "which", "while", "with", "would", "your",
];

/// Lower-cased content terms of a text: words longer than three
/// characters that are not stopwords, deduplicated in order of appearance.
pub fn content_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() <= 3 {
            continue;
        }
        let word = word.to_lowercase();
        if STOPWORDS.contains(&word.as_str()) || terms.contains(&word) {
            continue;
        }
        terms.push(word);
    }
    terms
}
