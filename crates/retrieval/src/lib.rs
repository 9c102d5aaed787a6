//! Retrieval client implementations for agentrail.
//!
//! Two backends sit behind the [`Retriever`] trait: an HTTP client for an
//! external vector service and a keyword index over a local directory.

pub mod http;
pub mod keyword;

pub use http::HttpRetriever;
pub use keyword::KeywordRetriever;

use agentrail_config::RetrievalConfig;
use agentrail_core::error::RetrievalError;
use agentrail_core::retrieval::Retriever;
use std::sync::Arc;
use tracing::info;

/// Build the retriever selected by configuration.
pub fn build_retriever(config: &RetrievalConfig) -> Result<Arc<dyn Retriever>, RetrievalError> {
    match config.backend.as_str() {
        "http" => {
            let url = config.service_url.as_deref().ok_or_else(|| {
                RetrievalError::Unavailable("retrieval.service_url is not set".into())
            })?;
            info!(url, "Using vector service retriever");
            Ok(Arc::new(HttpRetriever::new(url, config.timeout())?))
        }
        _ => {
            info!(dir = %config.kb_dir, "Using keyword retriever");
            Ok(Arc::new(KeywordRetriever::new(&config.kb_dir)))
        }
    }
}
