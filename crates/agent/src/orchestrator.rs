//! The orchestrator: runs one turn through Retrieve → Reason → Act → Record.
//!
//! Every expected failure is absorbed here:
//!
//! - retrieval errors and timeouts become "no passages"
//! - a failed tool gets exactly one substitution with the fallback tool
//! - a failed trace sink is logged and ignored
//!
//! Only a decision naming an unregistered tool aborts the turn.

use crate::answer::{self, AnswerWriter};
use crate::reasoner::Reasoner;
use agentrail_config::AppConfig;
use agentrail_core::context::SessionContext;
use agentrail_core::decision::{Decision, ToolKind};
use agentrail_core::error::{Error, RetrievalError};
use agentrail_core::query::{Passage, Query, rank_passages};
use agentrail_core::retrieval::Retriever;
use agentrail_core::tool::{ToolRegistry, ToolResult};
use agentrail_providers::LlmIntentClassifier;
use agentrail_telemetry::{StageLatency, TraceRecord, TraceSink};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// What a completed turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The text shown to the user
    pub answer: String,
    /// Everything that happened during the turn
    pub trace: TraceRecord,
}

impl TurnOutcome {
    pub fn decision(&self) -> &Decision {
        &self.trace.decision
    }
}

pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    reasoner: Reasoner,
    tools: Arc<ToolRegistry>,
    sink: Arc<dyn TraceSink>,
    top_k: usize,
    retrieval_timeout: Duration,
    fallback_tool: ToolKind,
    max_chain_hops: u32,
    writer: Option<AnswerWriter>,
}

impl Orchestrator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        reasoner: Reasoner,
        tools: Arc<ToolRegistry>,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            retriever,
            reasoner,
            tools,
            sink,
            top_k: 3,
            retrieval_timeout: Duration::from_secs(10),
            fallback_tool: ToolKind::Web,
            max_chain_hops: 1,
            writer: None,
        }
    }

    /// Wire every collaborator from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let retriever = agentrail_retrieval::build_retriever(&config.retrieval)?;
        let tools = agentrail_tools::build_registry(&config.tools);
        let sink = agentrail_telemetry::build_sink(&config.telemetry).map_err(|e| {
            Error::Config {
                message: format!("telemetry: {e}"),
            }
        })?;

        let generation = &config.reasoner.generation;
        let generator = agentrail_providers::build_generator(generation);

        let mut reasoner = Reasoner::from_config(config, tools.kinds());
        if let Some(g) = &generator {
            reasoner = reasoner.with_classifier(Arc::new(LlmIntentClassifier::new(g.clone())));
        }

        let mut orchestrator = Self::new(retriever, reasoner, Arc::new(tools), sink)
            .with_top_k(config.retrieval.top_k)
            .with_retrieval_timeout(config.retrieval.timeout())
            .with_fallback_tool(config.orchestrator.fallback_tool)
            .with_max_chain_hops(config.orchestrator.max_chain_hops);
        if let Some(g) = generator.filter(|_| generation.compose_answer) {
            orchestrator = orchestrator.with_answer_writer(AnswerWriter::new(g, generation.timeout()));
        }
        Ok(orchestrator)
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn with_fallback_tool(mut self, tool: ToolKind) -> Self {
        self.fallback_tool = tool;
        self
    }

    pub fn with_max_chain_hops(mut self, hops: u32) -> Self {
        self.max_chain_hops = hops.min(1);
        self
    }

    /// Let a generation backend write final answers.
    pub fn with_answer_writer(mut self, writer: AnswerWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn reasoner(&self) -> &Reasoner {
        &self.reasoner
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn.
    ///
    /// The session is updated only after the tool result is known; a turn
    /// that errors leaves it untouched.
    pub async fn run(&self, query: Query, ctx: &mut SessionContext) -> Result<TurnOutcome, Error> {
        // ── Retrieve ──
        let started = Instant::now();
        let k = query.top_k().unwrap_or(self.top_k).max(1);
        let (passages, retrieval_error) = match self.retrieve(&query.text, k).await {
            Ok(passages) => (passages, None),
            Err(e) => {
                warn!(retriever = %self.retriever.name(), error = %e, "Retrieval failed, continuing without passages");
                (Vec::new(), Some(e.to_string()))
            }
        };
        let retrieve_secs = started.elapsed().as_secs_f64();

        // ── Reason ──
        let started = Instant::now();
        let decision = self.reasoner.decide(&query.text, &passages, ctx).await;
        let reason_secs = started.elapsed().as_secs_f64();

        // ── Act ──
        let started = Instant::now();
        let tool_result = self.act(&decision, &query.text, &passages).await?;

        let fallback_result = if tool_result.is_failed() {
            Some(self.substitute(&decision, &query.text, &tool_result).await)
        } else {
            None
        };
        let final_result = fallback_result.as_ref().unwrap_or(&tool_result);

        let chain_result = match decision.chain_next {
            Some(next) if self.max_chain_hops > 0 && !final_result.is_failed() => {
                Some(self.chain(next, &decision, &query.text).await)
            }
            _ => None,
        };
        let final_answer = match &self.writer {
            Some(writer) => {
                writer
                    .write(&query.text, &passages, final_result, chain_result.as_ref(), ctx)
                    .await
            }
            None => answer::compose(final_result, chain_result.as_ref()),
        };
        let act_secs = started.elapsed().as_secs_f64();

        let simulated = [Some(&tool_result), fallback_result.as_ref(), chain_result.as_ref()]
            .into_iter()
            .flatten()
            .any(ToolResult::is_degraded);
        let final_for_session = final_result.clone();

        // ── Record ──
        let trace = TraceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: ctx.session_id.clone(),
            turn: ctx.turn_count() + 1,
            timestamp: Utc::now(),
            query: query.clone(),
            passages,
            retrieval_error,
            decision: decision.clone(),
            tool_result,
            fallback_result,
            chain_result,
            latency: StageLatency {
                retrieve: retrieve_secs,
                reason: reason_secs,
                act: act_secs,
            },
            final_answer: final_answer.clone(),
            simulated,
        };

        if let Err(e) = self.sink.emit(&trace) {
            warn!(error = %e, "Failed to record turn trace");
        }

        ctx.record_turn(query, decision, final_for_session);
        ctx.add_latency(trace.latency.total());

        info!(
            session = %trace.session_id,
            turn = trace.turn,
            tool = %trace.decision.selected_tool,
            status = %trace.final_result().status,
            confidence = trace.decision.confidence,
            latency_ms = (trace.latency.total() * 1000.0) as u64,
            "Turn complete"
        );

        Ok(TurnOutcome {
            answer: final_answer,
            trace,
        })
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        let passages = tokio::time::timeout(self.retrieval_timeout, self.retriever.fetch(query, k))
            .await
            .map_err(|_| RetrievalError::Timeout {
                timeout_ms: self.retrieval_timeout.as_millis() as u64,
            })??;
        Ok(rank_passages(passages, k))
    }

    async fn act(
        &self,
        decision: &Decision,
        query: &str,
        passages: &[Passage],
    ) -> Result<ToolResult, Error> {
        if decision.answers_from_context() {
            let top = passages
                .iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .map(|p| p.text.clone())
                .unwrap_or_default();
            return Ok(ToolResult::from_context(top));
        }

        self.tools.dispatch(decision, query).await.map_err(|e| {
            error!(tool = %decision.selected_tool, error = %e, "Decision names an unregistered tool");
            Error::Tool(e)
        })
    }

    /// The one substitution attempt after a failed primary dispatch.
    async fn substitute(&self, decision: &Decision, query: &str, failed: &ToolResult) -> ToolResult {
        warn!(
            tool = %decision.selected_tool,
            fallback = %self.fallback_tool,
            error = failed.error.as_deref().unwrap_or_default(),
            "Tool failed, trying fallback"
        );
        let started = Instant::now();
        match self
            .tools
            .execute(self.fallback_tool, decision.tool_query(query), &serde_json::Map::new())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(fallback = %self.fallback_tool, error = %e, "Fallback tool unavailable");
                ToolResult::failed(self.fallback_tool, e.to_string(), started.elapsed().as_secs_f64())
            }
        }
    }

    /// A single follow-up hop. Never falls back.
    async fn chain(&self, next: ToolKind, decision: &Decision, query: &str) -> ToolResult {
        let chain_query = decision
            .parameters
            .get("chain_query")
            .and_then(|v| v.as_str())
            .unwrap_or(query);
        let started = Instant::now();
        match self.tools.execute(next, chain_query, &serde_json::Map::new()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %next, error = %e, "Chained tool unavailable");
                ToolResult::failed(next, e.to_string(), started.elapsed().as_secs_f64())
            }
        }
    }
}
