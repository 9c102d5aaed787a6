//! Structured REST API lookup tool.
//!
//! Resolves a query such as "user 1" or "posts from user 2" to a REST
//! endpoint and fetches it. Simulated by default (deterministic records
//! shaped like the JSONPlaceholder API); live mode calls `base_url`.

use agentrail_core::decision::ToolKind;
use agentrail_core::error::ToolError;
use agentrail_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use regex_lite::Regex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::debug;

/// A resolved API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
}

impl ApiRequest {
    fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

fn pluralize(entity: &str) -> String {
    if entity.ends_with('s') {
        entity.to_string()
    } else {
        format!("{entity}s")
    }
}

fn captures(pattern: &str, text: &str) -> Option<Vec<String>> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}

/// Derive an endpoint from a natural-language query.
pub fn derive_request(query: &str) -> Option<ApiRequest> {
    let q = query.to_lowercase();

    if let Some(c) = captures(
        r"\b(posts?|comments?|todos?|albums?|orders?)\s+(?:from|by|for|of)\s+user\s*(?:id\s*)?#?(\d+)",
        &q,
    ) {
        return Some(ApiRequest::new(pluralize(&c[0])).with_param("userId", &c[1]));
    }

    if let Some(c) = captures(r"\bcomments?\s+(?:on|for)\s+post\s*#?(\d+)", &q) {
        return Some(ApiRequest::new("comments").with_param("postId", &c[0]));
    }

    if let Some(c) = captures(
        r"\b(user|post|order|account|customer|todo|album|comment)s?\s*(?:id\s*|number\s*)?[#:]?\s*(\d+)",
        &q,
    ) {
        return Some(ApiRequest::new(format!("{}/{}", pluralize(&c[0]), c[1])));
    }

    captures(r"\b(users|posts|orders|todos|albums|comments)\b", &q)
        .map(|c| ApiRequest::new(c[0].clone()))
}

/// Build the request from explicit parameters, falling back to the query.
fn resolve(
    query: &str,
    parameters: &serde_json::Map<String, Value>,
) -> Result<ApiRequest, ToolError> {
    if let Some(method) = parameters.get("method").and_then(Value::as_str) {
        if !method.eq_ignore_ascii_case("GET") {
            return Err(ToolError::InvalidArguments(format!(
                "unsupported HTTP method: {method}"
            )));
        }
    }

    let Some(endpoint) = parameters.get("endpoint").and_then(Value::as_str) else {
        return derive_request(query).ok_or_else(|| {
            ToolError::InvalidArguments(format!("no API endpoint recognized in: {query}"))
        });
    };

    let params = parameters
        .get("params")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ApiRequest {
        endpoint: endpoint.trim_matches('/').to_string(),
        params,
    })
}

pub struct ApiLookupTool {
    mode: Mode,
}

enum Mode {
    Live {
        base_url: String,
        api_key: Option<String>,
        client: reqwest::Client,
    },
    Simulated,
}

impl ApiLookupTool {
    pub fn live(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            mode: Mode::Live {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                api_key,
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn simulated() -> Self {
        Self {
            mode: Mode::Simulated,
        }
    }
}

async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    api_key: Option<&str>,
    request: &ApiRequest,
) -> Result<Value, ToolError> {
    let failed = |reason: String| ToolError::ExecutionFailed {
        tool_name: "API".into(),
        reason,
    };

    let url = format!("{base_url}/{}", request.endpoint);
    let mut builder = client
        .get(&url)
        .header("Content-Type", "application/json")
        .query(&request.params);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }

    let response = builder.send().await.map_err(|e| failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("{url} returned HTTP {}", status.as_u16())));
    }

    let text = response.text().await.map_err(|e| failed(e.to_string()))?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "text": text })))
}

fn simulated_record(request: &ApiRequest) -> Value {
    let mut parts = request.endpoint.split('/');
    let collection = parts.next().unwrap_or_default();
    let id: Option<u64> = parts.next().and_then(|s| s.parse().ok());

    match (collection, id) {
        ("users", Some(id)) => json!({
            "id": id,
            "name": format!("User {id}"),
            "username": format!("user{id}"),
            "email": format!("user{id}@example.com"),
            "company": {"name": "Example Corp"},
        }),
        ("orders", Some(id)) => json!({
            "id": id,
            "status": "shipped",
            "total": 42.5,
            "currency": "USD",
        }),
        (collection, Some(id)) => json!({
            "id": id,
            "title": format!("{} {id}", collection.trim_end_matches('s')),
        }),
        (collection, None) => {
            let owner = request
                .params
                .get("userId")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(1);
            let items: Vec<Value> = (1..=2)
                .map(|i| {
                    json!({
                        "id": owner.saturating_mul(10).saturating_add(i),
                        "userId": owner,
                        "title": format!("Sample {} {i} for user {owner}", collection.trim_end_matches('s')),
                    })
                })
                .collect();
            Value::Array(items)
        }
    }
}

#[async_trait]
impl Tool for ApiLookupTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Api
    }

    fn description(&self) -> &str {
        "Fetch structured records (users, posts, orders) from a REST API."
    }

    fn is_simulated(&self) -> bool {
        matches!(self.mode, Mode::Simulated)
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &serde_json::Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let request = resolve(query, parameters)?;
        debug!(endpoint = %request.endpoint, params = ?request.params, "API lookup");

        match &self.mode {
            Mode::Live {
                base_url,
                api_key,
                client,
            } => {
                let data = fetch(client, base_url, api_key.as_deref(), &request).await?;
                Ok(ToolOutput::live(json!({
                    "endpoint": request.endpoint,
                    "data": data,
                })))
            }
            Mode::Simulated => Ok(ToolOutput::simulated(json!({
                "endpoint": request.endpoint,
                "data": simulated_record(&request),
            }))),
        }
    }
}
