//! The decision-and-orchestration core of agentrail.
//!
//! Every turn follows a **Retrieve → Reason → Act → Record** cycle:
//!
//! 1. **Retrieve** scored passages for the query (failures mean "no passages")
//! 2. **Reason** about whether the passages suffice or a tool is needed
//! 3. **Act**: answer from context, or dispatch the chosen tool (with one
//!    fallback attempt and at most one chained hop)
//! 4. **Record** the turn in the session context and the trace sink
//!
//! The [`Reasoner`] is pure decision logic; the [`Orchestrator`] owns all
//! side effects.

pub mod answer;
pub mod orchestrator;
pub mod reasoner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use answer::compose;
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use reasoner::Reasoner;
