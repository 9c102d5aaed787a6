//! `agentrail config`: Configuration checks.

use agentrail_config::AppConfig;
use agentrail_core::decision::ToolKind;
use std::path::Path;

pub fn run(config_path: Option<&Path>, default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    println!("Validating configuration...");
    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e);
        }
    };
    println!("   Config parsed successfully");

    let mut warnings = Vec::new();
    if config.retrieval.backend == "keyword" && !Path::new(&config.retrieval.kb_dir).is_dir() {
        warnings.push(format!(
            "Knowledge base directory '{}' not found; every turn will run without passages",
            config.retrieval.kb_dir
        ));
    }
    if config.reasoner.generation.enabled
        && config.reasoner.generation.api_key.is_none()
        && config.reasoner.generation.hf_api_token.is_none()
    {
        warnings.push("Generation enabled but no OPENAI_API_KEY or HUGGINGFACE_API_TOKEN set".into());
    }
    if config.tools.web.enabled && config.tools.web.api_key.is_none() {
        warnings.push("No SERPAPI_KEY set; web search runs in simulated mode".into());
    }

    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    let enabled: Vec<String> = [ToolKind::Csv, ToolKind::Web, ToolKind::Api]
        .into_iter()
        .filter(|k| config.tool_enabled(*k))
        .map(|k| k.to_string())
        .collect();

    println!();
    println!("   Retrieval:  {} (top_k {})", config.retrieval.backend, config.retrieval.top_k);
    println!(
        "   Reasoner:   threshold {:.2}, overlap {:.2}",
        config.reasoner.relevance_threshold, config.reasoner.min_overlap
    );
    let generation = &config.reasoner.generation;
    match (generation.enabled, generation.compose_answer) {
        (false, _) => println!("   Generation: disabled"),
        (true, false) => println!("   Generation: {} (classifier)", generation.backend),
        (true, true) => println!("   Generation: {} (classifier, answers)", generation.backend),
    }
    println!("   Tools:      {}", enabled.join(", "));
    println!("   Fallback:   {}", config.orchestrator.fallback_tool);
    println!("   Traces:     {}", config.telemetry.sink);
    Ok(())
}
