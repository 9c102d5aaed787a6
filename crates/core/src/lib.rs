//! # agentrail core
//!
//! Domain types, traits, and error definitions for the agentrail
//! decision-and-orchestration pipeline. Every external collaborator
//! (retrieval service, tool backends, generation backend) is a trait here;
//! implementations live in their own crates.
//!
//! ## Design Philosophy
//!
//! - Tools form a closed set ([`ToolKind`]) dispatched through a registry.
//! - Expected outcomes (relevance miss, tool failure) are data values.
//! - Session state is an explicit value lent to each turn, never global.

pub mod context;
pub mod decision;
pub mod error;
pub mod generation;
pub mod query;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::{SessionContext, SessionStats, TurnRecord};
pub use decision::{Decision, ToolKind};
pub use error::{Error, Result};
pub use generation::{Generator, IntentClassifier, IntentGuess};
pub use query::{Passage, Query, content_terms, rank_passages};
pub use retrieval::Retriever;
pub use tool::{Tool, ToolOutput, ToolRegistry, ToolResult, ToolStatus};
