//! The Reasoner's output: which tool (if any) acts on a query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence at or below which a decision is considered a guess.
pub const LOW_CONFIDENCE: f32 = 0.3;

/// The closed set of actions a turn can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolKind {
    /// Answer directly from the retrieved passages.
    None,
    /// Product / price / inventory lookup in the local catalog.
    Csv,
    /// Open web search.
    Web,
    /// Structured REST API lookup.
    Api,
}

impl ToolKind {
    /// Every variant, in the priority order used when rules are ambiguous.
    pub const ALL: [ToolKind; 4] = [ToolKind::None, ToolKind::Csv, ToolKind::Api, ToolKind::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Csv => "CSV",
            Self::Web => "WEB",
            Self::Api => "API",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    /// Accepts the canonical labels plus the `TOOL_*` / `KB` forms
    /// generation backends tend to emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let label = normalized.strip_prefix("TOOL_").unwrap_or(&normalized);
        match label {
            "NONE" | "KB" | "CONTEXT" => Ok(Self::None),
            "CSV" => Ok(Self::Csv),
            "WEB" => Ok(Self::Web),
            "API" => Ok(Self::Api),
            other => Err(format!("unknown tool identifier: {other}")),
        }
    }
}

/// The Reasoner's chosen action for a turn. Consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The tool to invoke, or `None` to answer from context
    pub selected_tool: ToolKind,

    /// How sure the reasoner is, in [0, 1]
    pub confidence: f32,

    /// Short human-readable reason for the choice
    pub rationale: String,

    /// Arguments forwarded to the tool
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,

    /// Hint for a single follow-up tool hop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_next: Option<ToolKind>,
}

impl Decision {
    pub fn new(selected_tool: ToolKind, confidence: f32, rationale: impl Into<String>) -> Self {
        Self {
            selected_tool,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
            parameters: serde_json::Map::new(),
            chain_next: None,
        }
    }

    /// Set a tool parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Request one extra tool hop after the primary action.
    pub fn with_chain(mut self, next: ToolKind, chain_query: impl Into<String>) -> Self {
        self.chain_next = Some(next);
        self.parameters
            .insert("chain_query".into(), serde_json::Value::String(chain_query.into()));
        self
    }

    /// True when the passages were judged sufficient to answer directly.
    pub fn answers_from_context(&self) -> bool {
        self.selected_tool == ToolKind::None
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence <= LOW_CONFIDENCE
    }

    /// The query text the tool should act on.
    pub fn tool_query<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.parameters
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
    }
}
