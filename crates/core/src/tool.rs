//! Tool trait and registry: the execution contract shared by every backend.
//!
//! Tools are keyed by the closed [`ToolKind`] tag. The registry turns a
//! backend failure into a `FAILED` [`ToolResult`] value instead of an error;
//! only an unregistered tool is reported as `Err`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::decision::{Decision, ToolKind};
use crate::error::ToolError;

/// Outcome class of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolStatus {
    /// A live backend produced the payload.
    Ok,
    /// The backend failed; `payload` is empty.
    Failed,
    /// The payload came from a simulated backend.
    Degraded,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Failed => write!(f, "FAILED"),
            Self::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// The result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The tool that produced this result
    pub tool: ToolKind,

    /// Outcome class
    pub status: ToolStatus,

    /// Backend payload (absent on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Wall-clock time spent in the backend, in seconds
    pub latency_secs: f64,

    /// Failure reason, kept for the trace only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// A successful result answered from the retrieved context.
    pub fn from_context(text: impl Into<String>) -> Self {
        Self {
            tool: ToolKind::None,
            status: ToolStatus::Ok,
            payload: Some(serde_json::Value::String(text.into())),
            latency_secs: 0.0,
            error: None,
        }
    }

    pub fn failed(tool: ToolKind, reason: impl Into<String>, latency_secs: f64) -> Self {
        Self {
            tool,
            status: ToolStatus::Failed,
            payload: None,
            latency_secs,
            error: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ToolStatus::Failed
    }

    pub fn is_degraded(&self) -> bool {
        self.status == ToolStatus::Degraded
    }
}

/// What a backend hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub payload: serde_json::Value,
    /// Produced by a mock/simulated backend rather than a live one
    pub simulated: bool,
}

impl ToolOutput {
    pub fn live(payload: serde_json::Value) -> Self {
        Self {
            payload,
            simulated: false,
        }
    }

    pub fn simulated(payload: serde_json::Value) -> Self {
        Self {
            payload,
            simulated: true,
        }
    }
}

/// The core Tool trait.
///
/// Each backend (catalog, web search, structured API) implements this
/// and is registered in the [`ToolRegistry`] under its [`ToolKind`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tag this tool is dispatched under.
    fn kind(&self) -> ToolKind;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Whether the tool is running without a live backend.
    fn is_simulated(&self) -> bool {
        false
    }

    /// Execute the tool against a query.
    async fn execute(
        &self,
        query: &str,
        parameters: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<ToolOutput, ToolError>;
}

/// A registry of available tools, keyed by tag.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Box<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-dispatch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same tag.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let kind = tool.kind();
        if kind == ToolKind::None {
            warn!("Refusing to register a tool under NONE");
            return;
        }
        self.tools.insert(kind, tool);
    }

    /// Get a tool by tag.
    pub fn get(&self, kind: ToolKind) -> Option<&dyn Tool> {
        self.tools.get(&kind).map(|t| t.as_ref())
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }

    /// Registered tags, in a stable order.
    pub fn kinds(&self) -> Vec<ToolKind> {
        let mut kinds: Vec<ToolKind> = self.tools.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch the tool a decision selected.
    pub async fn dispatch(
        &self,
        decision: &Decision,
        query: &str,
    ) -> std::result::Result<ToolResult, ToolError> {
        self.execute(
            decision.selected_tool,
            decision.tool_query(query),
            &decision.parameters,
        )
        .await
    }

    /// Execute a tool by tag.
    ///
    /// Backend errors and timeouts become `FAILED` results; a simulated
    /// backend yields `DEGRADED`. Only an unregistered tag is an `Err`.
    pub async fn execute(
        &self,
        kind: ToolKind,
        query: &str,
        parameters: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&kind)
            .ok_or_else(|| ToolError::UnknownTool(kind.to_string()))?;

        debug!(tool = %kind, query, "Dispatching tool");

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, tool.execute(query, parameters)).await;
        let latency_secs = started.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(Ok(output)) => ToolResult {
                tool: kind,
                status: if output.simulated {
                    ToolStatus::Degraded
                } else {
                    ToolStatus::Ok
                },
                payload: Some(output.payload),
                latency_secs,
                error: None,
            },
            Ok(Err(e)) => {
                warn!(tool = %kind, error = %e, "Tool execution failed");
                ToolResult::failed(kind, e.to_string(), latency_secs)
            }
            Err(_) => {
                let err = ToolError::Timeout {
                    tool_name: kind.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                };
                warn!(tool = %kind, error = %err, "Tool timed out");
                ToolResult::failed(kind, err.to_string(), latency_secs)
            }
        };

        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
