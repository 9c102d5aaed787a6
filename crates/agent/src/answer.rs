//! Final answer composition.
//!
//! Turns the result of a turn's action into the text shown to the user.
//! The payload shape is chosen by the tool that produced it, so dispatch
//! is on `result.tool`, not on the original decision.

use agentrail_core::context::SessionContext;
use agentrail_core::decision::ToolKind;
use agentrail_core::generation::Generator;
use agentrail_core::query::Passage;
use agentrail_core::tool::ToolResult;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shown when the action (and its fallback) failed.
pub const FAILURE_MESSAGE: &str = "Sorry, I couldn't complete that request right now.";

const MAX_LINES: usize = 5;

/// Compose the user-facing answer for a turn.
pub fn compose(result: &ToolResult, chain: Option<&ToolResult>) -> String {
    let mut answer = render(result);

    if let Some(chained) = chain {
        answer.push_str("\n\n");
        if chained.is_failed() {
            let _ = write!(answer, "(The follow-up {} lookup failed.)", chained.tool);
        } else {
            let _ = write!(answer, "Follow-up ({}):\n{}", chained.tool, render(chained));
        }
    }
    answer
}

/// Writes the final answer with a generation backend.
///
/// The rule-based [`compose`] text is used whenever the backend errors,
/// times out or returns nothing, and for results whose wording is fixed:
/// failures keep the apology and catalog misses never pick up prices from
/// the passages.
pub struct AnswerWriter {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl AnswerWriter {
    pub fn new(generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn write(
        &self,
        query: &str,
        passages: &[Passage],
        result: &ToolResult,
        chain: Option<&ToolResult>,
        context: &SessionContext,
    ) -> String {
        let fallback = compose(result, chain);
        if result.is_failed() || is_catalog_miss(result) {
            return fallback;
        }

        let prompt = answer_prompt(query, passages, result, chain, context);
        let reply = match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(backend = %self.generator.name(), error = %e, "Answer generation failed, using rule-based answer");
                return fallback;
            }
            Err(_) => {
                warn!(backend = %self.generator.name(), timeout_secs = self.timeout.as_secs(), "Answer generation timed out, using rule-based answer");
                return fallback;
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            debug!("Empty generated answer, using rule-based answer");
            return fallback;
        }

        let mut answer = reply.to_string();
        if [Some(result), chain].into_iter().flatten().any(ToolResult::is_degraded) {
            answer.push_str(" (simulated data)");
        }
        answer
    }
}

fn is_catalog_miss(result: &ToolResult) -> bool {
    result.tool == ToolKind::Csv
        && result
            .payload
            .as_ref()
            .is_some_and(|p| p["status"] == "not_found")
}

fn answer_prompt(
    query: &str,
    passages: &[Passage],
    result: &ToolResult,
    chain: Option<&ToolResult>,
    context: &SessionContext,
) -> String {
    let mut prompt = format!("Query: {query}\n\n");

    if passages.is_empty() {
        prompt.push_str("Knowledge base: no hits\n");
    } else {
        prompt.push_str("Knowledge base:\n");
        for p in passages {
            let _ = writeln!(prompt, "- {}: {}", p.doc_id, p.text);
        }
    }

    for (label, r) in [("Tool result", Some(result)), ("Follow-up result", chain)] {
        let Some(r) = r else { continue };
        let payload = r
            .payload
            .as_ref()
            .map(|p| serde_json::to_string_pretty(p).unwrap_or_else(|_| p.to_string()))
            .unwrap_or_else(|| "none".into());
        let _ = writeln!(prompt, "\n{label} ({}, {}):\n{payload}", r.tool, r.status);
    }

    let _ = writeln!(prompt, "\nSession: {} previous turns", context.history_len());
    prompt.push_str(
        "\nYou are a helpful assistant. Using only the information above, \
         give a concise final answer to the query.",
    );
    prompt
}

fn render(result: &ToolResult) -> String {
    let Some(payload) = result.payload.as_ref().filter(|_| !result.is_failed()) else {
        return FAILURE_MESSAGE.to_string();
    };

    let mut text = match result.tool {
        ToolKind::None => payload
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string()),
        ToolKind::Csv => catalog(payload),
        ToolKind::Web => web(payload),
        ToolKind::Api => api(payload),
    };

    if result.is_degraded() {
        text.push_str(" (simulated data)");
    }
    text
}

// ── Catalog ───────────────────────────────────────────────────────────────

fn catalog(payload: &Value) -> String {
    if payload["status"] == "not_found" {
        let query = payload["query"].as_str().unwrap_or_default();
        return format!("I couldn't find '{query}' in the product catalog.");
    }

    if payload["list"] == true {
        let rows = payload["matches"].as_array().map(Vec::as_slice).unwrap_or_default();
        if rows.is_empty() {
            return "The product catalog is empty.".into();
        }
        let lines: Vec<String> = rows.iter().map(|row| format!("- {}", catalog_row(row, "name"))).collect();
        return format!("Catalog ({} items):\n{}", rows.len(), lines.join("\n"));
    }

    catalog_row(payload, "item")
}

/// `Blue Pen: 1.99 USD (SKU PEN456), 150 in stock`
fn catalog_row(row: &Value, name_key: &str) -> String {
    let name = text(&row[name_key]).unwrap_or_else(|| "Item".into());
    let mut line = name;

    if let Some(price) = price(&row["price"]) {
        let _ = write!(line, ": {price}");
        if let Some(currency) = text(&row["currency"]) {
            let _ = write!(line, " {currency}");
        }
    }
    if let Some(sku) = text(&row["sku"]) {
        let _ = write!(line, " (SKU {sku})");
    }
    match row["quantity"].as_i64() {
        Some(0) => line.push_str(", out of stock"),
        Some(n) => {
            let _ = write!(line, ", {n} in stock");
        }
        None => {}
    }
    line
}

fn price(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(|p| format!("{p:.2}")),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

// ── Web ───────────────────────────────────────────────────────────────────

fn web(payload: &Value) -> String {
    let results = payload["results"].as_array().map(Vec::as_slice).unwrap_or_default();
    if results.is_empty() {
        return "No web results found.".into();
    }
    results
        .iter()
        .take(MAX_LINES)
        .map(|r| {
            let title = text(&r["title"]).unwrap_or_default();
            match text(&r["snippet"]) {
                Some(snippet) => format!("{title}: {snippet}"),
                None => title,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── API ───────────────────────────────────────────────────────────────────

const API_FIELDS: &[&str] = &["name", "title", "username", "email", "status", "total"];

fn api(payload: &Value) -> String {
    let endpoint = payload["endpoint"].as_str().unwrap_or("api");
    match &payload["data"] {
        Value::Array(items) => {
            let mut out = format!("{} record(s) from {endpoint}", items.len());
            for item in items.iter().take(MAX_LINES) {
                let label = text(&item["title"])
                    .or_else(|| text(&item["name"]))
                    .unwrap_or_else(|| item["id"].to_string());
                let _ = write!(out, "\n- {label}");
            }
            out
        }
        Value::Object(record) => {
            let fields: Vec<String> = API_FIELDS
                .iter()
                .filter_map(|key| text(record.get(*key)?).map(|v| format!("{key}: {v}")))
                .collect();
            if fields.is_empty() {
                format!("{endpoint}: {}", Value::Object(record.clone()))
            } else {
                format!("{endpoint}: {}", fields.join(", "))
            }
        }
        other => format!("{endpoint}: {other}"),
    }
}

/// A scalar as display text; `None` for null, empty, or structured values.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
