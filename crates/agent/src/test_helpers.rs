//! Shared test doubles for reasoner and orchestrator tests.

use agentrail_core::context::SessionContext;
use agentrail_core::decision::ToolKind;
use agentrail_core::error::{GenerationError, RetrievalError, ToolError};
use agentrail_core::generation::{Generator, IntentClassifier, IntentGuess};
use agentrail_core::query::Passage;
use agentrail_core::retrieval::Retriever;
use agentrail_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns a fixed passage list.
pub struct StaticRetriever {
    passages: Vec<Passage>,
}

impl StaticRetriever {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, _query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// Always reports the retrieval service as down.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, RetrievalError> {
        Err(RetrievalError::Unavailable("connection refused".into()))
    }
}

/// Never answers within any reasonable timeout.
pub struct HangingRetriever;

#[async_trait]
impl Retriever for HangingRetriever {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn fetch(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, RetrievalError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(vec![])
    }
}

/// A tool with a scripted outcome that counts its calls.
pub struct ScriptedTool {
    kind: ToolKind,
    outcome: Result<serde_json::Value, String>,
    simulated: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTool {
    pub fn ok(kind: ToolKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            outcome: Ok(payload),
            simulated: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: ToolKind, reason: &str) -> Self {
        Self {
            kind,
            outcome: Err(reason.to_string()),
            simulated: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    /// Queries this tool was called with, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for ScriptedTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn description(&self) -> &str {
        "scripted test tool"
    }

    fn is_simulated(&self) -> bool {
        self.simulated
    }

    async fn execute(
        &self,
        query: &str,
        _parameters: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(query.to_string());
        match &self.outcome {
            Ok(payload) if self.simulated => Ok(ToolOutput::simulated(payload.clone())),
            Ok(payload) => Ok(ToolOutput::live(payload.clone())),
            Err(reason) => Err(ToolError::ExecutionFailed {
                tool_name: self.kind.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Shares a [`ScriptedTool`] between the registry and the test body.
pub struct SharedTool(pub std::sync::Arc<ScriptedTool>);

#[async_trait]
impl Tool for SharedTool {
    fn kind(&self) -> ToolKind {
        self.0.kind()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn is_simulated(&self) -> bool {
        self.0.is_simulated()
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        self.0.execute(query, parameters).await
    }
}

/// Returns the same guess every time and counts calls.
pub struct StubClassifier {
    guess: IntentGuess,
    calls: Mutex<usize>,
}

impl StubClassifier {
    pub fn new(guess: IntentGuess) -> Self {
        Self {
            guess,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl IntentClassifier for StubClassifier {
    fn name(&self) -> &str {
        "stub"
    }

    async fn classify(
        &self,
        _query: &str,
        _passages: &[Passage],
        _context: &SessionContext,
    ) -> Result<IntentGuess, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.guess.clone())
    }
}

/// A generation backend that is always down.
pub struct FailingClassifier;

#[async_trait]
impl IntentClassifier for FailingClassifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn classify(
        &self,
        _query: &str,
        _passages: &[Passage],
        _context: &SessionContext,
    ) -> Result<IntentGuess, GenerationError> {
        Err(GenerationError::Unavailable("connection refused".into()))
    }
}

/// Replies with fixed text and keeps every prompt it was sent.
pub struct CannedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// A generation backend that is always down.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("connection refused".into()))
    }
}
