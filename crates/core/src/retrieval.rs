//! Retriever trait: the thin interface to the external vector service.

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::query::Passage;

/// Returns up to `k` passages for a query, ordered by descending score.
///
/// Implementations: HTTP vector service, local keyword index, test doubles.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The retriever name (e.g., "http", "keyword").
    fn name(&self) -> &str;

    /// Fetch scored passages for a query.
    async fn fetch(&self, query: &str, k: usize) -> std::result::Result<Vec<Passage>, RetrievalError>;
}
