//! Deterministic stand-ins for the embedder, analyzer, and knowledge base

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use elerag::config::{Config, EntityPolicy, Profile};
use elerag::kb::{KbCandidate, KnowledgeBase};
use elerag::memory::Embedder;
use elerag::nlp::{is_stop_word, Analysis, Analyzer, EntityLabel, EntitySpan, HeuristicAnalyzer};
use elerag::{RagError, Result};

pub const HASH_DIMENSION: usize = 4096;

/// Bag-of-words embedder: each non-stop-word token bumps one hashed slot.
///
/// Texts with the same token bag embed identically; disjoint bags are
/// (barring hash collisions) orthogonal.
pub struct HashEmbedder;

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !is_stop_word(t))
        .collect()
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; HASH_DIMENSION];
                for token in tokens(text) {
                    vector[(fnv1a(&token) % HASH_DIMENSION as u64) as usize] += 1.0;
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        HASH_DIMENSION
    }
}

/// Analyzer with a fixed surface -> label table.
///
/// Sentences come from the heuristic segmenter; spans are the longest
/// case-sensitive, word-bounded table matches that do not overlap.
pub struct TableAnalyzer {
    table: Vec<(String, EntityLabel)>,
    segmenter: HeuristicAnalyzer,
}

impl TableAnalyzer {
    pub fn new(entries: &[(&str, EntityLabel)]) -> Self {
        let mut table: Vec<(String, EntityLabel)> = entries
            .iter()
            .map(|(surface, label)| (surface.to_string(), *label))
            .collect();
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            table,
            segmenter: HeuristicAnalyzer::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    fn spans_in(&self, sentence: &str) -> Vec<EntitySpan> {
        let mut taken: Vec<(usize, usize, EntitySpan)> = Vec::new();
        for (surface, label) in &self.table {
            for (start, _) in sentence.match_indices(surface.as_str()) {
                let end = start + surface.len();
                let bounded_left = sentence[..start]
                    .chars()
                    .next_back()
                    .map(|c| !c.is_alphanumeric())
                    .unwrap_or(true);
                let bounded_right = sentence[end..]
                    .chars()
                    .next()
                    .map(|c| !c.is_alphanumeric())
                    .unwrap_or(true);
                let overlaps = taken.iter().any(|(s, e, _)| start < *e && *s < end);
                if bounded_left && bounded_right && !overlaps {
                    taken.push((
                        start,
                        end,
                        EntitySpan {
                            text: surface.clone(),
                            label: *label,
                            sentence: sentence.to_string(),
                        },
                    ));
                }
            }
        }
        taken.sort_by_key(|(start, _, _)| *start);
        taken.into_iter().map(|(_, _, span)| span).collect()
    }
}

impl Analyzer for TableAnalyzer {
    fn analyze(&self, text: &str) -> Analysis {
        let sentences = self.segmenter.sentences(text);
        let entities = sentences.iter().flat_map(|s| self.spans_in(s)).collect();
        Analysis {
            sentences,
            entities,
        }
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        self.segmenter.sentences(text)
    }
}

/// Knowledge base answering from a fixed table, counting calls
#[derive(Default)]
pub struct StubKnowledgeBase {
    entries: HashMap<String, Vec<KbCandidate>>,
    calls: AtomicUsize,
}

impl StubKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, surface: &str, candidates: Vec<KbCandidate>) -> Self {
        self.entries.insert(surface.to_string(), candidates);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeBase for StubKnowledgeBase {
    async fn search(&self, surface: &str, limit: usize) -> Result<Vec<KbCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut hits = self.entries.get(surface).cloned().unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Knowledge base whose every lookup fails
#[derive(Default)]
pub struct FailingKnowledgeBase {
    calls: AtomicUsize,
}

impl FailingKnowledgeBase {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeBase for FailingKnowledgeBase {
    async fn search(&self, _surface: &str, _limit: usize) -> Result<Vec<KbCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::KbUnavailable("connection reset by peer".to_string()))
    }
}

/// Improved-profile config with memory and cache files under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::for_profile(Profile::Improved);
    config.entities.policy = EntityPolicy::Always;
    config.paths.memory_file = dir.join("pi_memory.json").to_string_lossy().to_string();
    config.paths.entity_cache_file = dir.join("entity_cache.json").to_string_lossy().to_string();
    config
}

pub fn write_source(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write source file");
    path
}
