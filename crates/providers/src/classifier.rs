//! Intent classification through a generation backend.
//!
//! Builds a compact prompt from the query, the top passages, and the
//! session's tool usage, then reads a tool label back out of the reply.

use agentrail_core::context::SessionContext;
use agentrail_core::decision::ToolKind;
use agentrail_core::error::GenerationError;
use agentrail_core::generation::{Generator, IntentClassifier, IntentGuess};
use agentrail_core::query::Passage;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

/// Passages quoted in the prompt.
const PROMPT_PASSAGES: usize = 2;
/// Characters kept per quoted passage.
const PASSAGE_CHARS: usize = 300;

pub struct LlmIntentClassifier {
    generator: Arc<dyn Generator>,
}

impl LlmIntentClassifier {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

pub(crate) fn build_prompt(query: &str, passages: &[Passage], context: &SessionContext) -> String {
    let mut prompt = String::from(
        "Decide which tool should answer the user query.\n\
         Tools:\n\
         - NONE: the knowledge-base passages already answer it\n\
         - CSV: product, price, SKU, or inventory lookup\n\
         - API: structured record lookup (users, posts, orders by id)\n\
         - WEB: current events or general knowledge\n\n",
    );

    let _ = writeln!(prompt, "Query: {query}");

    if passages.is_empty() {
        prompt.push_str("Passages: none\n");
    } else {
        prompt.push_str("Passages:\n");
        for p in passages.iter().take(PROMPT_PASSAGES) {
            let snippet: String = p.text.chars().take(PASSAGE_CHARS).collect();
            let _ = writeln!(prompt, "- [{:.2}] {}: {}", p.score, p.doc_id, snippet);
        }
    }

    let usage: Vec<String> = context
        .tool_usage()
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    let _ = writeln!(
        prompt,
        "Session: {} previous turns, tool usage {}",
        context.history_len(),
        usage.join(", ")
    );

    prompt.push_str(
        "\nReply with JSON only: {\"decision\": \"CSV|WEB|API|NONE\", \
         \"confidence\": 0.0-1.0, \"reason\": \"...\"}",
    );
    prompt
}

#[derive(Deserialize)]
struct Reply {
    #[serde(alias = "tool", alias = "label")]
    decision: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    reason: Option<String>,
}

fn from_json(text: &str) -> Option<IntentGuess> {
    let reply: Reply = serde_json::from_str(text).ok()?;
    let tool = reply.decision.parse::<ToolKind>().ok()?;
    Some(IntentGuess {
        tool,
        confidence: reply.confidence.map(|c| c.clamp(0.0, 1.0)),
        reason: reply.reason.unwrap_or_default(),
    })
}

/// Parse a backend reply: whole JSON, then an embedded `{...}`, then a bare label.
pub fn parse_reply(text: &str) -> Result<IntentGuess, GenerationError> {
    let trimmed = text.trim();

    if let Some(guess) = from_json(trimmed) {
        return Ok(guess);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(guess) = from_json(&trimmed[start..=end]) {
                return Ok(guess);
            }
        }
    }

    let upper = trimmed.to_uppercase();
    let label = upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .find_map(|word| match word {
            "CSV" | "TOOL_CSV" => Some(ToolKind::Csv),
            "WEB" | "TOOL_WEB" => Some(ToolKind::Web),
            "API" | "TOOL_API" => Some(ToolKind::Api),
            "NONE" | "KB" => Some(ToolKind::None),
            _ => None,
        });

    label
        .map(|tool| IntentGuess {
            tool,
            confidence: None,
            reason: "label found in backend reply".into(),
        })
        .ok_or_else(|| {
            let shown: String = trimmed.chars().take(80).collect();
            GenerationError::Unparseable(shown)
        })
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    fn name(&self) -> &str {
        self.generator.name()
    }

    async fn classify(
        &self,
        query: &str,
        passages: &[Passage],
        context: &SessionContext,
    ) -> Result<IntentGuess, GenerationError> {
        let prompt = build_prompt(query, passages, context);
        let reply = self.generator.generate(&prompt).await?;
        debug!(backend = %self.generator.name(), reply = %reply, "Classifier reply");
        parse_reply(&reply)
    }
}
