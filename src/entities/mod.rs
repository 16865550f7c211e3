//! Entity extraction and knowledge-base disambiguation
//!
//! Turns NER spans into `(kind, value)` tags: text-kind labels become
//! lowercased surface tags, everything else is resolved to a knowledge-base
//! id by comparing the span's sentence against each candidate's description.

pub mod resolver;

pub use resolver::{EntityResolver, ResolverStats};
