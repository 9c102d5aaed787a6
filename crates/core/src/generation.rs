//! Generation backend traits.
//!
//! The language-generation backend is optional. It is reached through two
//! seams: [`Generator`] (prompt in, free text out) and [`IntentClassifier`]
//! (query in, tool label out). The reasoner only ever sees the classifier,
//! so tests can substitute a deterministic stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;
use crate::decision::ToolKind;
use crate::error::GenerationError;
use crate::query::Passage;

/// A backend that turns a prompt into free text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// The backend name (e.g., "openai", "huggingface").
    fn name(&self) -> &str;

    /// Generate a completion for a prompt.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError>;
}

/// A classifier's guess at which tool a query needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentGuess {
    pub tool: ToolKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(default)]
    pub reason: String,
}

/// Classifies a query into one of the closed tool tags.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(
        &self,
        query: &str,
        passages: &[Passage],
        context: &SessionContext,
    ) -> std::result::Result<IntentGuess, GenerationError>;
}
