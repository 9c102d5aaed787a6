//! Generation backends for agentrail.
//!
//! The generation backend is optional. It is consulted when the reasoner's
//! rule table has no answer and, when enabled, to write final answers.
//! Backends implement `agentrail_core::Generator`; the classifier adapts any
//! generator to `agentrail_core::IntentClassifier`.

pub mod classifier;
pub mod fallback;
pub mod huggingface;
pub mod openai_compat;
pub mod router;

pub use classifier::{LlmIntentClassifier, parse_reply};
pub use fallback::FallbackGenerator;
pub use huggingface::HuggingFaceGenerator;
pub use openai_compat::OpenAiCompatGenerator;
pub use router::build_generator;
