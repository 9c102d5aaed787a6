//! Backend selection: builds the generation chain from configuration.

use crate::fallback::FallbackGenerator;
use crate::huggingface::HuggingFaceGenerator;
use crate::openai_compat::OpenAiCompatGenerator;
use agentrail_config::GenerationConfig;
use agentrail_core::generation::Generator;
use std::sync::Arc;
use tracing::info;

fn openai(config: &GenerationConfig) -> Option<Arc<dyn Generator>> {
    let key = config.api_key.as_ref()?;
    Some(Arc::new(OpenAiCompatGenerator::new(
        "openai",
        &config.api_url,
        key,
        &config.model,
    )))
}

fn huggingface(config: &GenerationConfig) -> Option<Arc<dyn Generator>> {
    let token = config.hf_api_token.as_ref()?;
    Some(Arc::new(HuggingFaceGenerator::new(
        &config.hf_api_url,
        token,
        &config.hf_model,
    )))
}

/// Build the generator chain, preferred backend first.
///
/// Returns `None` when generation is disabled or no backend has
/// credentials.
pub fn build_generator(config: &GenerationConfig) -> Option<Arc<dyn Generator>> {
    if !config.enabled {
        return None;
    }

    let ordered = if config.backend == "huggingface" {
        [huggingface(config), openai(config)]
    } else {
        [openai(config), huggingface(config)]
    };

    let chain = ordered
        .into_iter()
        .flatten()
        .fold(FallbackGenerator::new("generation"), |chain, g| {
            chain.add(g, config.timeout())
        });

    if chain.is_empty() {
        info!("Generation enabled but no backend credentials found; generation disabled");
        return None;
    }

    info!(backends = chain.len(), preferred = %config.backend, "Generation backend ready");
    Some(Arc::new(chain))
}
