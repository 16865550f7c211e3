//! Answer generation through an external llama.cpp-compatible binary
//!
//! Components:
//! - Prompt: `### Context / ### Instruction / ### Response` templates per profile
//! - Llama: subprocess invocation with a hard timeout
//! - Cleaner: one-sentence answer extraction from raw generator output
//! - Report: evidence file for the legal profile

pub mod cleaner;
pub mod llama;
pub mod prompt;
pub mod report;

pub use cleaner::clean_answer;
pub use llama::{GeneratorOutput, LlamaCliGenerator};
pub use prompt::build_prompt;
pub use report::EvidenceReport;
