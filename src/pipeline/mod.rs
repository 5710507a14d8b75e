//! Message analysis pipeline.
//!
//! Eight stages, each a standalone capability with one entry point:
//! parsing, classification, summarization, tone analysis, importance
//! scoring, action decision, reply drafting, and the orchestrator that
//! sequences them. The AI-assisted stages (classify, summarize, reply)
//! carry a deterministic fallback tier and report which tier produced
//! their result.

pub mod actions;
pub mod classifier;
pub mod importance;
pub mod orchestrator;
pub mod parser;
pub mod reply;
pub mod summarizer;
pub mod tone;
pub mod types;

pub use orchestrator::AnalysisPipeline;
pub use types::{AnalysisRecord, RawMessage};
