//! `agentrail ask`: one query, one answer.

use agentrail_agent::Orchestrator;
use agentrail_core::context::SessionContext;
use agentrail_core::query::Query;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    query: &str,
    top_k: Option<usize>,
    trace: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let mut query = Query::new(query);
    if let Some(k) = top_k {
        query = query.with_metadata("top_k", serde_json::json!(k));
    }

    let mut session = SessionContext::new();
    let outcome = orchestrator.run(query, &mut session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.trace)?);
        return Ok(());
    }

    println!("{}", outcome.answer);
    if trace {
        println!();
        print!("{}", outcome.trace.render());
    }
    Ok(())
}
