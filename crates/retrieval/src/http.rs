//! Client for an external vector search service.
//!
//! Protocol: `POST {base_url}/search` with `{"query": "...", "k": N}`.
//! The service answers with a JSON array of `{doc_id, text, score}` objects
//! (or the same array wrapped as `{"results": [...]}`).

use agentrail_core::error::RetrievalError;
use agentrail_core::query::{Passage, rank_passages};
use agentrail_core::retrieval::Retriever;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpRetriever {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<SearchHit>),
    Wrapped { results: Vec<SearchHit> },
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(alias = "id")]
    doc_id: String,
    text: String,
    score: f32,
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        let url = format!("{}/search", self.base_url);
        debug!(url = %url, k, "Querying vector service");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    RetrievalError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Vector service returned error");
            return Err(RetrievalError::Unavailable(format!(
                "vector service returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        let hits = match parsed {
            SearchResponse::Bare(hits) | SearchResponse::Wrapped { results: hits } => hits,
        };

        let passages = hits
            .into_iter()
            .filter(|h| h.score.is_finite())
            .map(|h| Passage::new(h.doc_id, h.text, h.score))
            .collect();

        Ok(rank_passages(passages, k))
    }
}
