//! Hugging Face Inference API generation backend.
//!
//! `POST {base_url}/models/{model}` with `{inputs, parameters, options}`.
//! Text2text models answer `[{"generated_text": "..."}]`; some deployments
//! return a bare object instead, which is accepted too.

use agentrail_core::error::GenerationError;
use agentrail_core::generation::Generator;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

pub struct HuggingFaceGenerator {
    base_url: String,
    api_token: String,
    model: String,
    client: reqwest::Client,
}

impl HuggingFaceGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

fn generated_text(body: &Value) -> Option<String> {
    let entry = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    entry
        .get("generated_text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl Generator for HuggingFaceGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {"max_new_tokens": 100, "temperature": 0.1},
            "options": {"wait_for_model": true},
        });

        debug!(model = %self.model, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(GenerationError::NotConfigured(
                "Invalid Hugging Face token".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Inference API returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let body: Value = response.json().await.map_err(|e| GenerationError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        generated_text(&body).ok_or_else(|| GenerationError::ApiError {
            status_code: 200,
            message: "No generated_text in response".into(),
        })
    }
}
