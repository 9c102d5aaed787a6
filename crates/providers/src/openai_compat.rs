//! OpenAI-compatible generation backend.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing
//! `/chat/completions`. Requests are single-turn with temperature 0 so
//! classification replies are as repeatable as the backend allows.

use agentrail_core::error::GenerationError;
use agentrail_core::generation::Generator;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// An OpenAI-compatible chat completions client.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an OpenAI generator (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Create an Ollama generator (convenience constructor).
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
            model,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.0,
            "max_tokens": 150,
            "stream": false,
        });

        debug!(backend = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(GenerationError::NotConfigured(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Generation backend returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GenerationError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["temperature"], 0.0);
                assert_eq!(body["messages"][0]["role"], "user");
                Json(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"decision\": \"CSV\"}"}}]
                }))
            }),
        );
        let url = serve(app).await;

        let generator = OpenAiCompatGenerator::new("test", url, "sk-test", "gpt-test");
        let text = generator.generate("classify").await.unwrap();
        assert_eq!(text, "{\"decision\": \"CSV\"}");
    }

    #[tokio::test]
    async fn auth_failure_is_not_configured() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let url = serve(app).await;

        let generator = OpenAiCompatGenerator::new("test", url, "wrong", "gpt-test");
        let err = generator.generate("classify").await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = serve(app).await;

        let generator = OpenAiCompatGenerator::new("test", url, "sk", "gpt-test");
        match generator.generate("classify").await.unwrap_err() {
            GenerationError::ApiError { status_code, .. } => assert_eq!(status_code, 500),
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[test]
    fn trailing_slash_trimmed() {
        let generator = OpenAiCompatGenerator::ollama(Some("http://localhost:11434/v1/"), "llama3");
        assert_eq!(generator.base_url, "http://localhost:11434/v1");
        assert_eq!(generator.model(), "llama3");
    }
}
