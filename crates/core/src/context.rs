//! Per-session context store.
//!
//! One [`SessionContext`] per session, owned by the caller and lent to the
//! orchestrator as `&mut` for each turn. It is only mutated at the end of a
//! turn, once the tool result (or its absence) is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decision::{Decision, ToolKind};
use crate::query::Query;
use crate::tool::ToolResult;

/// One completed turn as remembered by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub query: Query,
    pub decision: Decision,
    pub result: ToolResult,
}

/// Mutable session state: history, tool-usage counters, last results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Unique session id
    pub session_id: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Completed turns
    turn_count: u64,

    /// Completed turns, oldest first
    history: Vec<TurnRecord>,

    /// Turns per selected tool (NONE counts answers from context)
    tool_usage: BTreeMap<ToolKind, u64>,

    /// Sum of per-turn stage latencies, in seconds
    total_latency_secs: f64,
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub total_turns: u64,
    pub tool_usage: BTreeMap<ToolKind, u64>,
    pub total_latency_secs: f64,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            turn_count: 0,
            history: Vec::new(),
            tool_usage: ToolKind::ALL.iter().map(|k| (*k, 0)).collect(),
            total_latency_secs: 0.0,
        }
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// The last `n` turns, oldest first. Fewer if the history is shorter.
    pub fn get_history(&self, n: usize) -> &[TurnRecord] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The most recent turn, if any.
    pub fn last_turn(&self) -> Option<&TurnRecord> {
        self.history.last()
    }

    pub fn tool_usage(&self) -> &BTreeMap<ToolKind, u64> {
        &self.tool_usage
    }

    pub fn usage_of(&self, kind: ToolKind) -> u64 {
        self.tool_usage.get(&kind).copied().unwrap_or(0)
    }

    /// Turns that dispatched a real tool (excludes NONE).
    pub fn total_tool_calls(&self) -> u64 {
        self.tool_usage
            .iter()
            .filter(|(k, _)| **k != ToolKind::None)
            .map(|(_, v)| v)
            .sum()
    }

    pub fn total_latency_secs(&self) -> f64 {
        self.total_latency_secs
    }

    /// Append a completed turn and bump the counters.
    pub fn record_turn(&mut self, query: Query, decision: Decision, result: ToolResult) {
        *self.tool_usage.entry(decision.selected_tool).or_insert(0) += 1;
        self.turn_count += 1;
        self.history.push(TurnRecord {
            query,
            decision,
            result,
        });
    }

    /// Accumulate a turn's total latency.
    pub fn add_latency(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.total_latency_secs += secs;
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            total_turns: self.turn_count,
            tool_usage: self.tool_usage.clone(),
            total_latency_secs: self.total_latency_secs,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
