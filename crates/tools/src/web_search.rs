//! Web search tool: SerpAPI-backed, with a simulated fallback mode.
//!
//! Without an API key the tool returns deterministic placeholder results
//! so the pipeline can run end-to-end offline; those results are DEGRADED.

use agentrail_core::decision::ToolKind;
use agentrail_core::error::ToolError;
use agentrail_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub struct WebSearchTool {
    mode: Mode,
    num_results: usize,
}

enum Mode {
    Live {
        base_url: String,
        api_key: String,
        client: reqwest::Client,
    },
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub source: String,
}

#[derive(Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

impl WebSearchTool {
    pub fn live(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            mode: Mode::Live {
                base_url: base_url.into(),
                api_key: api_key.into(),
                client: reqwest::Client::new(),
            },
            num_results: 3,
        }
    }

    pub fn simulated() -> Self {
        Self {
            mode: Mode::Simulated,
            num_results: 3,
        }
    }

    pub fn with_num_results(mut self, n: usize) -> Self {
        self.num_results = n.clamp(1, 10);
        self
    }

    async fn serpapi(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        api_key: &str,
        query: &str,
        count: usize,
    ) -> Result<Vec<SearchResult>, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool_name: "WEB".into(),
            reason,
        };

        let count_str = count.to_string();
        let response = client
            .get(base_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", count_str.as_str()),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("search API returned HTTP {}", status.as_u16())));
        }

        let body: SerpResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed search response: {e}")))?;

        if let Some(error) = body.error {
            return Err(failed(error));
        }

        Ok(body
            .organic_results
            .into_iter()
            .take(count)
            .map(|r| SearchResult {
                title: r.title,
                snippet: r.snippet,
                link: r.link,
                source: "serpapi".into(),
            })
            .collect())
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Web
    }

    fn description(&self) -> &str {
        "Search the web for current events and general knowledge."
    }

    fn is_simulated(&self) -> bool {
        matches!(self.mode, Mode::Simulated)
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &serde_json::Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("empty search query".into()));
        }

        let count = parameters
            .get("num_results")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(self.num_results)
            .clamp(1, 10);

        match &self.mode {
            Mode::Live {
                base_url,
                api_key,
                client,
            } => {
                debug!(query, count, "Web search");
                let results = self.serpapi(client, base_url, api_key, query, count).await?;
                Ok(ToolOutput::live(serde_json::json!({ "results": results })))
            }
            Mode::Simulated => {
                let results = simulated_results(query, count);
                Ok(ToolOutput::simulated(serde_json::json!({ "results": results })))
            }
        }
    }
}

fn simulated_results(query: &str, count: usize) -> Vec<SearchResult> {
    let encoded = query.split_whitespace().collect::<Vec<_>>().join("+");
    (0..count)
        .map(|i| SearchResult {
            title: format!("Search result {} for: {}", i + 1, query),
            snippet: format!(
                "Simulated result for '{query}'. Configure a search API key for live results."
            ),
            link: format!("https://example.com/search?q={encoded}&p={}", i + 1),
            source: "simulated".into(),
        })
        .collect()
}
