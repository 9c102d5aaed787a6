//! End-to-end tests for the agentrail pipeline.
//!
//! These run real retrievers, tools, and sinks from the workspace crates
//! (tool backends in simulated mode or against temp files) and check the
//! whole Retrieve → Reason → Act → Record cycle.

use std::path::Path;
use std::sync::Arc;

use agentrail_agent::{Orchestrator, Reasoner};
use agentrail_config::AppConfig;
use agentrail_core::context::SessionContext;
use agentrail_core::decision::ToolKind;
use agentrail_core::error::{Error, RetrievalError, ToolError};
use agentrail_core::generation::{IntentClassifier, IntentGuess};
use agentrail_core::query::{Passage, Query};
use agentrail_core::retrieval::Retriever;
use agentrail_core::tool::{Tool, ToolOutput, ToolRegistry, ToolStatus};
use agentrail_retrieval::KeywordRetriever;
use agentrail_telemetry::{MemorySink, TraceRecord};
use agentrail_tools::{ApiLookupTool, CatalogTool, WebSearchTool, default_registry};

// ── Fixtures ─────────────────────────────────────────────────────────────

const KB: &str = "\
Our refund policy allows returns within 30 days of purchase with a receipt.

Shipping is free on orders above fifty dollars.
";

const CATALOG: &str = "\
sku,name,price,currency,stock
X1,Item X,9.99,USD,5
PEN456,Blue Pen,1.99,USD,0
";

struct Workspace {
    _dir: tempfile::TempDir,
    kb_dir: std::path::PathBuf,
    catalog: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let kb_dir = dir.path().join("kb");
    std::fs::create_dir_all(&kb_dir).unwrap();
    std::fs::write(kb_dir.join("policies.md"), KB).unwrap();
    let catalog = dir.path().join("catalog.csv");
    std::fs::write(&catalog, CATALOG).unwrap();
    Workspace {
        _dir: dir,
        kb_dir,
        catalog,
    }
}

fn registry(catalog: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CatalogTool::from_path(catalog)));
    registry.register(Box::new(WebSearchTool::simulated()));
    registry.register(Box::new(ApiLookupTool::simulated()));
    registry
}

fn pipeline(ws: &Workspace) -> (Orchestrator, Arc<MemorySink>) {
    let registry = registry(&ws.catalog);
    let sink = Arc::new(MemorySink::new());
    let reasoner = Reasoner::new().with_available_tools(registry.kinds());
    let orchestrator = Orchestrator::new(
        Arc::new(KeywordRetriever::new(&ws.kb_dir)),
        reasoner,
        Arc::new(registry),
        sink.clone(),
    );
    (orchestrator, sink)
}

// ── Test doubles ─────────────────────────────────────────────────────────

struct DownRetriever;

#[async_trait::async_trait]
impl Retriever for DownRetriever {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, RetrievalError> {
        Err(RetrievalError::Unavailable("connection refused".into()))
    }
}

/// Fails every call and counts them.
struct BrokenTool {
    kind: ToolKind,
    calls: Arc<std::sync::Mutex<usize>>,
}

impl BrokenTool {
    fn new(kind: ToolKind) -> (Self, Arc<std::sync::Mutex<usize>>) {
        let calls = Arc::new(std::sync::Mutex::new(0));
        (
            Self {
                kind,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait::async_trait]
impl Tool for BrokenTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn execute(
        &self,
        _query: &str,
        _parameters: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        *self.calls.lock().unwrap() += 1;
        Err(ToolError::ExecutionFailed {
            tool_name: self.kind.to_string(),
            reason: "backend down".into(),
        })
    }
}

/// A deterministic stand-in for the generation backend.
struct FixedClassifier(ToolKind);

#[async_trait::async_trait]
impl IntentClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn classify(
        &self,
        _query: &str,
        _passages: &[Passage],
        _context: &SessionContext,
    ) -> Result<IntentGuess, agentrail_core::error::GenerationError> {
        Ok(IntentGuess {
            tool: self.0,
            confidence: Some(0.55),
            reason: "fixed label".into(),
        })
    }
}

// ── Retrieval-first answers ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_policy_question_answered_from_knowledge_base() {
    let ws = workspace();
    let (orchestrator, sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("What is the refund policy?"), &mut session)
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::None);
    assert!(out.answer.contains("30 days"));
    assert_eq!(out.trace.passages[0].doc_id, "policies.md#1");
    assert_eq!(session.usage_of(ToolKind::None), 1);
    assert_eq!(sink.len(), 1);
}

// ── Tool routing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_price_question_reads_catalog() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("What is the price of item X?"), &mut session)
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::Csv);
    assert_eq!(out.trace.tool_result.status, ToolStatus::Ok);
    assert!(out.answer.contains("9.99"), "answer: {}", out.answer);
    assert!(!out.trace.simulated);
}

#[tokio::test]
async fn e2e_sku_lookup_reports_out_of_stock() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("Is PEN456 available?"), &mut session)
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::Csv);
    assert!(out.answer.contains("Blue Pen"));
    assert!(out.answer.contains("out of stock"));
}

#[tokio::test]
async fn e2e_user_lookup_goes_to_api_and_is_degraded() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("Show me user ID 1"), &mut session)
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::Api);
    assert_eq!(out.trace.tool_result.status, ToolStatus::Degraded);
    assert!(out.trace.simulated);
    assert!(out.answer.contains("user1@example.com"));
    assert!(out.answer.ends_with("(simulated data)"));
}

#[tokio::test]
async fn e2e_no_signal_falls_back_to_web() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("Tell me something interesting"), &mut session)
        .await
        .unwrap();

    let decision = out.decision();
    assert_eq!(decision.selected_tool, ToolKind::Web);
    assert!(decision.is_low_confidence());
    assert!(decision.rationale.contains("fallback"));
    assert!(out.trace.passages.is_empty());
}

#[tokio::test]
async fn e2e_classifier_used_only_on_rule_miss() {
    let ws = workspace();
    let registry = registry(&ws.catalog);
    let reasoner = Reasoner::new()
        .with_available_tools(registry.kinds())
        .with_classifier(Arc::new(FixedClassifier(ToolKind::Api)));
    let orchestrator = Orchestrator::new(
        Arc::new(KeywordRetriever::new(&ws.kb_dir)),
        reasoner,
        Arc::new(registry),
        Arc::new(MemorySink::new()),
    );
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("Show me all users"), &mut session)
        .await
        .unwrap();
    assert_eq!(out.decision().selected_tool, ToolKind::Api);
    assert!(out.decision().rationale.contains("structured entity"));

    let out = orchestrator
        .run(Query::new("Tell me something interesting"), &mut session)
        .await
        .unwrap();
    assert_eq!(out.decision().selected_tool, ToolKind::Api);
    assert!(out.decision().rationale.contains("fixed label"));
}

// ── Failure handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_retrieval_outage_still_answers() {
    let ws = workspace();
    let registry = registry(&ws.catalog);
    let orchestrator = Orchestrator::new(
        Arc::new(DownRetriever),
        Reasoner::new(),
        Arc::new(registry),
        Arc::new(MemorySink::new()),
    );
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("What is the refund policy?"), &mut session)
        .await
        .unwrap();

    assert!(out.trace.passages.is_empty());
    assert!(out.trace.retrieval_error.is_some());
    assert_ne!(out.decision().selected_tool, ToolKind::None);
    assert_eq!(session.turn_count(), 1);
}

#[tokio::test]
async fn e2e_failed_tool_gets_one_fallback() {
    let (broken, calls) = BrokenTool::new(ToolKind::Api);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(broken));
    registry.register(Box::new(WebSearchTool::simulated()));

    let sink = Arc::new(MemorySink::new());
    let orchestrator = Orchestrator::new(
        Arc::new(DownRetriever),
        Reasoner::new().with_available_tools(registry.kinds()),
        Arc::new(registry),
        sink.clone(),
    );
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("Get order #7"), &mut session)
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), 1);
    let trace: TraceRecord = sink.last().unwrap();
    assert_eq!(trace.fallback_attempts(), 1);
    assert_eq!(trace.tool_result.status, ToolStatus::Failed);
    assert_eq!(trace.final_result().tool, ToolKind::Web);
    assert!(!out.answer.is_empty());
}

#[tokio::test]
async fn e2e_failed_web_search_is_retried_once() {
    let (broken, calls) = BrokenTool::new(ToolKind::Web);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(broken));

    let sink = Arc::new(MemorySink::new());
    let orchestrator = Orchestrator::new(
        Arc::new(DownRetriever),
        Reasoner::new().with_available_tools(registry.kinds()),
        Arc::new(registry),
        sink.clone(),
    );
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("latest headlines today"), &mut session)
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), 2);
    let trace: TraceRecord = sink.last().unwrap();
    assert_eq!(trace.fallback_attempts(), 1);
    assert_eq!(trace.final_result().status, ToolStatus::Failed);
    assert!(out.answer.contains("couldn't complete"));
}

#[tokio::test]
async fn e2e_simulated_api_handles_huge_user_id() {
    let registry = default_registry();
    let orchestrator = Orchestrator::new(
        Arc::new(DownRetriever),
        Reasoner::new().with_available_tools(registry.kinds()),
        Arc::new(registry),
        Arc::new(MemorySink::new()),
    );
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(
            Query::new("Show me posts from user 18446744073709551615"),
            &mut session,
        )
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::Api);
    assert_eq!(out.trace.tool_result.status, ToolStatus::Degraded);
    assert!(out.answer.starts_with("2 record(s) from posts"));
    assert_eq!(session.turn_count(), 1);
}

#[tokio::test]
async fn e2e_unknown_tool_is_an_error() {
    let ws = workspace();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WebSearchTool::simulated()));

    let orchestrator = Orchestrator::new(
        Arc::new(KeywordRetriever::new(&ws.kb_dir)),
        // the reasoner is told every tool exists; the registry disagrees
        Reasoner::new(),
        Arc::new(registry),
        Arc::new(MemorySink::new()),
    );
    let mut session = SessionContext::new();

    let err = orchestrator
        .run(Query::new("How much does the cost of item X come to?"), &mut session)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Tool(ToolError::UnknownTool(_))));
    assert_eq!(session.turn_count(), 0);
}

// ── Chaining ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_chained_catalog_then_web() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(
            Query::new("Find the price of item X and then search for reviews online"),
            &mut session,
        )
        .await
        .unwrap();

    assert_eq!(out.decision().selected_tool, ToolKind::Csv);
    assert_eq!(out.decision().chain_next, Some(ToolKind::Web));
    let chained = out.trace.chain_result.as_ref().unwrap();
    assert_eq!(chained.tool, ToolKind::Web);
    assert!(out.answer.contains("9.99"));
    assert!(out.answer.contains("Follow-up (WEB)"));
}

// ── Session ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_counters_accumulate() {
    let ws = workspace();
    let (orchestrator, sink) = pipeline(&ws);
    let mut session = SessionContext::with_id("e2e");

    for q in [
        "What is the refund policy?",
        "price of item X",
        "latest news on coffee",
        "Show me user ID 2",
        "price of blue pen",
    ] {
        orchestrator.run(Query::new(q), &mut session).await.unwrap();
    }

    let stats = session.stats();
    assert_eq!(stats.total_turns, 5);
    assert_eq!(stats.tool_usage[&ToolKind::None], 1);
    assert_eq!(stats.tool_usage[&ToolKind::Csv], 2);
    assert_eq!(stats.tool_usage[&ToolKind::Web], 1);
    assert_eq!(stats.tool_usage[&ToolKind::Api], 1);
    assert_eq!(session.total_tool_calls(), 4);
    assert_eq!(session.get_history(2).len(), 2);
    assert_eq!(session.last_turn().unwrap().query.text, "price of blue pen");

    let turns: Vec<u64> = sink.records().iter().map(|r| r.turn).collect();
    assert_eq!(turns, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn e2e_decisions_are_repeatable() {
    let ws = workspace();
    let (orchestrator, _sink) = pipeline(&ws);
    let mut first = SessionContext::new();
    let mut second = SessionContext::new();

    for q in ["price of item X", "What is the refund policy?", "anything at all"] {
        let a = orchestrator.run(Query::new(q), &mut first).await.unwrap();
        let b = orchestrator.run(Query::new(q), &mut second).await.unwrap();
        assert_eq!(a.trace.decision, b.trace.decision, "query {q:?}");
        assert_eq!(a.answer, b.answer);
    }
}

// ── Configuration wiring ─────────────────────────────────────────────────

#[tokio::test]
async fn e2e_from_config_file_writes_jsonl_traces() {
    let ws = workspace();
    let traces = ws.kb_dir.parent().unwrap().join("traces.jsonl");
    let config_path = ws.kb_dir.parent().unwrap().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[retrieval]\nkb_dir = {:?}\n\n[tools.csv]\ncatalog_path = {:?}\n\n[telemetry]\nsink = \"jsonl\"\npath = {:?}\n",
            ws.kb_dir.display().to_string(),
            ws.catalog.display().to_string(),
            traces.display().to_string(),
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    let mut session = SessionContext::new();

    let out = orchestrator
        .run(Query::new("What is the price of item X?"), &mut session)
        .await
        .unwrap();
    assert!(out.answer.contains("9.99"));

    let content = std::fs::read_to_string(&traces).unwrap();
    let record: TraceRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(record.decision.selected_tool, ToolKind::Csv);
    assert_eq!(record.final_answer, out.answer);
}
