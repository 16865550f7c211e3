//! ELERAG - Entity-Linked Retrieval-Augmented Generation
//!
//! A small question-answering engine over a local corpus of short facts.
//! Ingest embeds every chunk, links named entities to knowledge-base ids,
//! and writes one memory file; queries fuse dense similarity and entity
//! overlap with Reciprocal Rank Fusion, drop near-duplicate passages, and
//! hand the survivors to an external llama.cpp binary for a one-sentence
//! answer.
//!
//! # Architecture
//!
//! - **memory**: chunk records, memory file, entity cache, embeddings
//! - **nlp**: sentence segmentation and named-entity recognition
//! - **kb**: knowledge-base search (Wikidata by default)
//! - **entities**: span resolution with context disambiguation
//! - **ingest**: source loading, chunking, ingest orchestration
//! - **rag**: query expansion, hybrid retrieval, query pipeline
//! - **generation**: prompts, generator subprocess, answer cleaning

pub mod errors;

pub use errors::{RagError, Result};

pub mod cli;
pub mod config;

pub mod entities;
pub mod kb;
pub mod memory;
pub mod nlp;

pub mod ingest;
pub mod rag;

pub mod generation;
