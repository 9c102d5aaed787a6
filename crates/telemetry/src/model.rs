//! Data model for per-turn trace records.

use agentrail_core::decision::Decision;
use agentrail_core::query::{Passage, Query};
use agentrail_core::tool::ToolResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

// ── Stage latency ─────────────────────────────────────────────────────────

/// Wall-clock time per pipeline stage, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageLatency {
    pub retrieve: f64,
    pub reason: f64,
    pub act: f64,
}

impl StageLatency {
    pub fn total(&self) -> f64 {
        self.retrieve + self.reason + self.act
    }
}

// ── Trace record ──────────────────────────────────────────────────────────

/// One append-only entry per turn capturing every intermediate value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Unique record id.
    pub id: String,
    /// Session this turn belongs to.
    pub session_id: String,
    /// 1-based turn number within the session.
    pub turn: u64,
    /// When the turn finished.
    pub timestamp: DateTime<Utc>,
    pub query: Query,
    pub passages: Vec<Passage>,
    /// Why retrieval produced no passages, when it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<String>,
    pub decision: Decision,
    /// Result of the primary action.
    pub tool_result: ToolResult,
    /// The single substitution attempted after a failed primary dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_result: Option<ToolResult>,
    /// Result of the chain hop, if one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_result: Option<ToolResult>,
    pub latency: StageLatency,
    pub final_answer: String,
    /// True when any result in the turn came from a simulated backend.
    pub simulated: bool,
}

impl TraceRecord {
    /// The result the answer was composed from.
    pub fn final_result(&self) -> &ToolResult {
        self.fallback_result.as_ref().unwrap_or(&self.tool_result)
    }

    /// Substitutions attempted this turn (0 or 1).
    pub fn fallback_attempts(&self) -> usize {
        usize::from(self.fallback_result.is_some())
    }

    /// Human-readable multi-line rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "── Trace {} (session {}, turn {}) ──", self.id, self.session_id, self.turn);
        let _ = writeln!(out, "query:     {}", self.query.text);

        match &self.retrieval_error {
            Some(err) => {
                let _ = writeln!(out, "retrieval: unavailable ({err})");
            }
            None => {
                let _ = writeln!(out, "retrieval: {} passage(s)", self.passages.len());
            }
        }
        for p in &self.passages {
            let snippet: String = p.text.chars().take(60).collect();
            let _ = writeln!(out, "  [{:.2}] {} {}", p.score, p.doc_id, snippet.replace('\n', " "));
        }

        let d = &self.decision;
        let _ = writeln!(
            out,
            "decision:  {} (confidence {:.2}) {}",
            d.selected_tool, d.confidence, d.rationale
        );
        if let Some(next) = d.chain_next {
            let _ = writeln!(out, "  chain →   {next}");
        }

        let mut line = |label: &str, r: &ToolResult| {
            let _ = write!(out, "{label:<10} {} {} in {:.3}s", r.tool, r.status, r.latency_secs);
            if let Some(err) = &r.error {
                let _ = write!(out, " ({err})");
            }
            out.push('\n');
        };
        line("result:", &self.tool_result);
        if let Some(r) = &self.fallback_result {
            line("fallback:", r);
        }
        if let Some(r) = &self.chain_result {
            line("chain:", r);
        }

        let _ = writeln!(
            out,
            "latency:   retrieve {:.3}s, reason {:.3}s, act {:.3}s, total {:.3}s",
            self.latency.retrieve,
            self.latency.reason,
            self.latency.act,
            self.latency.total()
        );
        if self.simulated {
            out.push_str("simulated: yes\n");
        }
        out
    }
}
