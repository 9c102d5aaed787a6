//! The Reasoner: picks the action for a turn.
//!
//! Deterministic rule table first, optional intent classifier second:
//!
//! 1. **Relevance**: the top passage scores at least the relevance
//!    threshold and contains enough of the query's content terms → `NONE`.
//! 2. **Triggers**, in priority CSV > API > WEB: catalog terms, structured
//!    entity lookups, current-events phrasing.
//! 3. **Fallback**: ask the classifier (if configured), otherwise choose the
//!    fallback tool with low confidence.
//!
//! `decide` never fails and never mutates anything; with no classifier (or
//! a deterministic one) identical inputs yield identical decisions.

use agentrail_config::AppConfig;
use agentrail_core::context::SessionContext;
use agentrail_core::decision::{Decision, ToolKind};
use agentrail_core::generation::IntentClassifier;
use agentrail_core::query::{Passage, content_terms};
use regex_lite::Regex;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Confidence assigned when no rule fired and no classifier answered.
pub const FALLBACK_CONFIDENCE: f32 = 0.2;

/// Confidence used when the classifier gives a label but no score.
const CLASSIFIER_DEFAULT_CONFIDENCE: f32 = 0.5;

const CSV_TERMS: &[&str] = &[
    "price", "prices", "priced", "cost", "costs", "buy", "purchase", "sku", "product",
    "products", "item", "items", "inventory", "stock", "catalog", "catalogue",
];

const API_TERMS: &[&str] = &[
    "user", "users", "order", "orders", "account", "accounts", "customer", "customers", "post",
    "posts", "comment", "comments", "todo", "todos",
];

const WEB_TERMS: &[&str] = &[
    "news", "latest", "today", "headline", "headlines", "breaking", "update", "updates",
    "current", "recent", "weather", "search", "google", "tips",
];

const WEB_PHRASES: &[&str] = &["how to", "who is", "who won", "what happened"];

/// Which rule fired for a clause, with the evidence.
#[derive(Debug, Clone, PartialEq)]
struct Trigger {
    tool: ToolKind,
    confidence: f32,
    evidence: String,
}

pub struct Reasoner {
    relevance_threshold: f32,
    min_overlap: f32,
    fallback_tool: ToolKind,
    available: BTreeSet<ToolKind>,
    chaining: bool,
    classifier: Option<Arc<dyn IntentClassifier>>,
    classifier_timeout: Duration,
}

impl Reasoner {
    /// A reasoner with default thresholds and every tool available.
    pub fn new() -> Self {
        Self {
            relevance_threshold: 0.6,
            min_overlap: 0.5,
            fallback_tool: ToolKind::Web,
            available: ToolKind::ALL.into_iter().collect(),
            chaining: true,
            classifier: None,
            classifier_timeout: Duration::from_secs(30),
        }
    }

    /// Build from configuration; `available` lists the registered tools.
    pub fn from_config(config: &AppConfig, available: impl IntoIterator<Item = ToolKind>) -> Self {
        Self::new()
            .with_thresholds(config.reasoner.relevance_threshold, config.reasoner.min_overlap)
            .with_fallback_tool(config.orchestrator.fallback_tool)
            .with_available_tools(available)
            .with_chaining(config.orchestrator.max_chain_hops > 0)
            .with_classifier_timeout(config.reasoner.generation.timeout())
    }

    pub fn with_thresholds(mut self, relevance_threshold: f32, min_overlap: f32) -> Self {
        self.relevance_threshold = relevance_threshold.clamp(0.0, 1.0);
        self.min_overlap = min_overlap.clamp(0.0, 1.0);
        self
    }

    pub fn with_fallback_tool(mut self, tool: ToolKind) -> Self {
        self.fallback_tool = tool;
        self
    }

    /// Restrict decisions to these tools (`NONE` is always allowed).
    pub fn with_available_tools(mut self, tools: impl IntoIterator<Item = ToolKind>) -> Self {
        self.available = tools.into_iter().collect();
        self.available.insert(ToolKind::None);
        self
    }

    pub fn with_chaining(mut self, enabled: bool) -> Self {
        self.chaining = enabled;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    pub fn relevance_threshold(&self) -> f32 {
        self.relevance_threshold
    }

    /// Decide the action for a query.
    pub async fn decide(
        &self,
        query: &str,
        passages: &[Passage],
        context: &SessionContext,
    ) -> Decision {
        let (primary, chain_clause) = split_chain(query);

        let decision = match self.relevance(primary, passages) {
            Some(decision) => decision,
            None => match self.first_trigger(primary) {
                Some(trigger) => Decision::new(trigger.tool, trigger.confidence, trigger.evidence),
                None => self.fallback(primary, passages, context).await,
            },
        };

        let decision = self.with_parameters(decision, primary);
        let decision = match chain_clause {
            Some(clause) if self.chaining => self.attach_chain(decision, clause),
            _ => decision,
        };

        debug!(
            tool = %decision.selected_tool,
            confidence = decision.confidence,
            rationale = %decision.rationale,
            "Reasoner decision"
        );
        decision
    }

    // ── Rule 1: relevance ─────────────────────────────────────────────

    fn relevance(&self, query: &str, passages: &[Passage]) -> Option<Decision> {
        let top = passages
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))?;
        if top.score < self.relevance_threshold {
            return None;
        }

        let coverage = overlap(query, &top.text);
        if coverage < self.min_overlap {
            return None;
        }

        Some(Decision::new(
            ToolKind::None,
            top.score,
            format!(
                "top passage {} scored {:.2} (threshold {:.2}) and covers {:.0}% of the query terms",
                top.doc_id,
                top.score,
                self.relevance_threshold,
                coverage * 100.0
            ),
        ))
    }

    // ── Rule 2: triggers ──────────────────────────────────────────────

    fn first_trigger(&self, clause: &str) -> Option<Trigger> {
        triggers(clause)
            .into_iter()
            .find(|t| self.available.contains(&t.tool))
    }

    // ── Rule 3: classifier / fallback ─────────────────────────────────

    async fn fallback(
        &self,
        query: &str,
        passages: &[Passage],
        context: &SessionContext,
    ) -> Decision {
        let Some(classifier) = &self.classifier else {
            return self.default_fallback("no rule matched and no generation backend is configured");
        };

        let outcome = tokio::time::timeout(
            self.classifier_timeout,
            classifier.classify(query, passages, context),
        )
        .await;

        let guess = match outcome {
            Ok(Ok(guess)) => guess,
            Ok(Err(e)) => {
                warn!(backend = %classifier.name(), error = %e, "Intent classifier failed");
                return self.default_fallback(&format!("generation backend unavailable ({e})"));
            }
            Err(_) => {
                warn!(
                    backend = %classifier.name(),
                    timeout_ms = self.classifier_timeout.as_millis() as u64,
                    "Intent classifier timed out"
                );
                return self.default_fallback("generation backend timed out");
            }
        };

        if guess.tool == ToolKind::None && passages.is_empty() {
            return self.default_fallback("classifier chose NONE but there are no passages");
        }
        if !self.available.contains(&guess.tool) {
            return self.default_fallback(&format!(
                "classifier chose {} which is not available",
                guess.tool
            ));
        }

        let mut rationale = format!("generation backend classified the query as {}", guess.tool);
        if !guess.reason.is_empty() {
            rationale.push_str(": ");
            rationale.push_str(&guess.reason);
        }
        Decision::new(
            guess.tool,
            guess.confidence.unwrap_or(CLASSIFIER_DEFAULT_CONFIDENCE),
            rationale,
        )
    }

    fn default_fallback(&self, why: &str) -> Decision {
        Decision::new(
            self.fallback_tool,
            FALLBACK_CONFIDENCE,
            format!("{why}; fallback to {}", self.fallback_tool),
        )
    }

    // ── Parameters & chaining ─────────────────────────────────────────

    fn with_parameters(&self, decision: Decision, clause: &str) -> Decision {
        let decision = decision.with_param("query", json!(clause));
        match decision.selected_tool {
            ToolKind::Csv => {
                let decision = match agentrail_tools::sku_token(clause) {
                    Some(sku) => decision.with_param("sku", json!(sku)),
                    None => decision,
                };
                match agentrail_tools::product_term(clause) {
                    Some(term) => decision.with_param("product", json!(term)),
                    None => decision,
                }
            }
            ToolKind::Api => match agentrail_tools::derive_request(clause) {
                Some(req) => {
                    let params: serde_json::Map<String, Value> = req
                        .params
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect();
                    decision
                        .with_param("endpoint", json!(req.endpoint))
                        .with_param("method", json!("GET"))
                        .with_param("params", Value::Object(params))
                }
                None => decision,
            },
            ToolKind::Web | ToolKind::None => decision,
        }
    }

    fn attach_chain(&self, decision: Decision, clause: &str) -> Decision {
        match self.first_trigger(clause) {
            Some(next) if next.tool != decision.selected_tool => {
                decision.with_chain(next.tool, clause)
            }
            _ => decision,
        }
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::new()
    }
}

/// Fraction of the query's content terms found in a passage.
fn overlap(query: &str, passage: &str) -> f32 {
    let terms = content_terms(query);
    if terms.is_empty() {
        return 0.0;
    }
    let text = passage.to_lowercase();
    let hits = terms.iter().filter(|t| text.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}

/// Split `"<primary> and then <follow-up>"` / `"<primary>, then <follow-up>"`.
fn split_chain(query: &str) -> (&str, Option<&str>) {
    let Ok(re) = Regex::new(r"(?i)(?:,\s*|\s+and\s+)then\s+") else {
        return (query, None);
    };
    match re.find(query) {
        Some(m) => {
            let primary = query[..m.start()].trim();
            let rest = query[m.end()..].trim();
            if primary.is_empty() || rest.is_empty() {
                (query, None)
            } else {
                (primary, Some(rest))
            }
        }
        None => (query, None),
    }
}

fn words(clause: &str) -> Vec<String> {
    clause
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn find_term<'a>(words: &[String], terms: &[&'a str]) -> Option<&'a str> {
    terms.iter().copied().find(|t| words.iter().any(|w| w == t))
}

/// Every trigger that fires for a clause, in priority order CSV > API > WEB.
fn triggers(clause: &str) -> Vec<Trigger> {
    let words = words(clause);
    let lowered = clause.to_lowercase();
    let mut fired = Vec::new();

    if let Some(term) = find_term(&words, CSV_TERMS) {
        fired.push(Trigger {
            tool: ToolKind::Csv,
            confidence: 0.9,
            evidence: format!("catalog term '{term}' in query"),
        });
    } else if let Some(sku) = agentrail_tools::sku_token(clause) {
        fired.push(Trigger {
            tool: ToolKind::Csv,
            confidence: 0.8,
            evidence: format!("SKU-like token '{sku}' in query"),
        });
    }

    let id_pattern = Regex::new(r"(?i)(?:\bid\b|#)\s*:?\s*\d+").is_ok_and(|re| re.is_match(clause));
    if let Some(term) = find_term(&words, API_TERMS) {
        fired.push(Trigger {
            tool: ToolKind::Api,
            confidence: 0.85,
            evidence: format!("structured entity '{term}' in query"),
        });
    } else if id_pattern {
        fired.push(Trigger {
            tool: ToolKind::Api,
            confidence: 0.7,
            evidence: "identifier pattern in query".into(),
        });
    }

    if let Some(term) = find_term(&words, WEB_TERMS) {
        fired.push(Trigger {
            tool: ToolKind::Web,
            confidence: 0.8,
            evidence: format!("current-events term '{term}' in query"),
        });
    } else if let Some(phrase) = WEB_PHRASES.iter().find(|p| lowered.contains(*p)) {
        fired.push(Trigger {
            tool: ToolKind::Web,
            confidence: 0.7,
            evidence: format!("general-knowledge phrasing '{phrase}'"),
        });
    }

    fired
}
