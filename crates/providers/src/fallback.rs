//! Generator fallback: ordered retry chain with per-backend timeouts.
//!
//! When a backend fails (timeout, auth, error), automatically tries the next
//! backend in the chain. The first success wins.

use agentrail_core::error::GenerationError;
use agentrail_core::generation::Generator;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A generator that wraps an ordered list of generators and falls back on failure.
pub struct FallbackGenerator {
    name: String,
    chain: Vec<FallbackEntry>,
}

/// A single entry in the fallback chain.
struct FallbackEntry {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl FallbackGenerator {
    /// Create a new fallback generator with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add a generator to the chain with a custom timeout.
    pub fn add(mut self, generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { generator, timeout });
        self
    }

    /// Add a generator with the default timeout (30s).
    pub fn add_default(self, generator: Arc<dyn Generator>) -> Self {
        self.add(generator, Duration::from_secs(30))
    }

    /// Number of generators in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl Generator for FallbackGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut last_error =
            GenerationError::NotConfigured("No generators in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let backend = entry.generator.name().to_string();

            info!(
                backend = %backend,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying generator"
            );

            match tokio::time::timeout(entry.timeout, entry.generator.generate(prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(
                        backend = %backend,
                        error = %e,
                        "Fallback: generator failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        backend = %backend,
                        timeout_ms = entry.timeout.as_millis() as u64,
                        "Fallback: generator timed out, trying next"
                    );
                    last_error = GenerationError::Timeout(format!(
                        "Generator '{}' timed out after {}ms",
                        backend,
                        entry.timeout.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }
}
