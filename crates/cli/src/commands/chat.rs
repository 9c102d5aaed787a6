//! `agentrail chat`: interactive session sharing one context.

use agentrail_agent::Orchestrator;
use agentrail_core::context::SessionContext;
use agentrail_core::query::Query;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<&Path>, trace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let orchestrator = Orchestrator::from_config(&config)?;
    let mut session = SessionContext::new();

    let tools: Vec<String> = orchestrator
        .tools()
        .kinds()
        .iter()
        .map(|k| {
            let simulated = orchestrator.tools().get(*k).is_some_and(|t| t.is_simulated());
            if simulated {
                format!("{k} (simulated)")
            } else {
                k.to_string()
            }
        })
        .collect();

    println!();
    println!("  agentrail: interactive session");
    println!();
    println!("  Session:    {}", session.session_id);
    println!("  Retrieval:  {}", config.retrieval.backend);
    println!("  Tools:      {}", tools.join(", "));
    println!("  Threshold:  {:.2}", orchestrator.reasoner().relevance_threshold());
    println!();
    println!("  Type a question and press Enter.");
    println!("  Type 'stats' for session statistics, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "stats" => {
                print_stats(&session);
                continue;
            }
            _ => {}
        }

        match orchestrator.run(Query::new(input), &mut session).await {
            Ok(outcome) => {
                println!();
                for line in outcome.answer.lines() {
                    println!("  Assistant > {line}");
                }
                if trace {
                    println!();
                    for line in outcome.trace.render().lines() {
                        println!("  {line}");
                    }
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    print_stats(&session);
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn print_stats(session: &SessionContext) {
    let stats = session.stats();
    println!();
    println!("  Turns:      {}", stats.total_turns);
    for (tool, count) in &stats.tool_usage {
        println!("  {:<11} {count}", format!("{tool}:"));
    }
    println!("  Latency:    {:.3}s total", stats.total_latency_secs);
    println!();
}
