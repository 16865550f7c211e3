// Hybrid retrieval: dense + entity-overlap ranks fused with RRF, then a diversity filter
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{RetrievalConfig, RRF_CONSTANT};
use crate::memory::embedding::cosine_similarity;
use crate::memory::{ChunkId, ChunkRecord, EntitySet};

/// A chunk id with its fused RRF score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: ChunkId,
    pub score: f64,
}

/// Descending by score, ascending id on ties
fn by_score_then_id(a: (ChunkId, f64), b: (ChunkId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Retrieval engine over an in-memory slice of chunk records.
///
/// Records are addressed by id, which equals their position.
pub struct RetrievalEngine {
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top `dense_pool` ids by cosine similarity to `query`
    pub fn dense_rank(&self, query: &[f32], memory: &[ChunkRecord]) -> Vec<ChunkId> {
        let mut scored: Vec<(ChunkId, f64)> = memory
            .iter()
            .map(|record| (record.id, cosine_similarity(query, &record.vector) as f64))
            .collect();
        scored.sort_by(|a, b| by_score_then_id(*a, *b));
        scored.truncate(self.config.dense_pool);
        scored.into_iter().map(|(id, _)| id).collect()
    }

    /// Top `dense_pool` ids by entity overlap; records without overlap are left out
    pub fn entity_rank(&self, query_entities: &EntitySet, memory: &[ChunkRecord]) -> Vec<ChunkId> {
        if query_entities.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(ChunkId, f64)> = memory
            .iter()
            .map(|record| (record.id, record.entity_overlap(query_entities) as f64))
            .filter(|(_, matches)| *matches > 0.0)
            .collect();
        scored.sort_by(|a, b| by_score_then_id(*a, *b));
        scored.truncate(self.config.dense_pool);
        scored.into_iter().map(|(id, _)| id).collect()
    }

    /// Reciprocal Rank Fusion: `score(id) = Σ 1 / (60 + rank)` over the lists
    /// containing `id`, with 0-based ranks
    pub fn fuse(lists: &[&[ChunkId]]) -> Vec<ScoredChunk> {
        let mut scores: BTreeMap<ChunkId, f64> = BTreeMap::new();
        for list in lists {
            for (rank, id) in list.iter().enumerate() {
                *scores.entry(*id).or_insert(0.0) += 1.0 / (RRF_CONSTANT + rank as f64);
            }
        }

        let mut fused: Vec<(ChunkId, f64)> = scores.into_iter().collect();
        fused.sort_by(|a, b| by_score_then_id(*a, *b));
        fused
            .into_iter()
            .map(|(id, score)| ScoredChunk { id, score })
            .collect()
    }

    /// Greedy selection of up to `final_k` candidates, skipping any whose
    /// vector is closer than `diversity_threshold` to one already taken
    pub fn diversify(&self, candidates: &[ScoredChunk], memory: &[ChunkRecord]) -> Vec<ScoredChunk> {
        let mut selected: Vec<ScoredChunk> = Vec::with_capacity(self.config.final_k);

        for candidate in candidates {
            if selected.len() >= self.config.final_k {
                break;
            }
            let Some(record) = memory.get(candidate.id) else {
                continue;
            };

            let redundant = selected.iter().any(|chosen| {
                memory
                    .get(chosen.id)
                    .map(|other| {
                        cosine_similarity(&record.vector, &other.vector)
                            > self.config.diversity_threshold
                    })
                    .unwrap_or(false)
            });
            if redundant {
                debug!(id = candidate.id, "candidate dropped as near-duplicate");
                continue;
            }
            selected.push(*candidate);
        }

        selected
    }

    /// Full retrieval: dense and entity ranks, RRF, top `candidate_pool`, diversity
    pub fn retrieve(
        &self,
        query: &[f32],
        query_entities: &EntitySet,
        memory: &[ChunkRecord],
    ) -> Vec<ScoredChunk> {
        if memory.is_empty() {
            return Vec::new();
        }

        let dense = self.dense_rank(query, memory);
        let entity = self.entity_rank(query_entities, memory);

        let mut candidates = Self::fuse(&[dense.as_slice(), entity.as_slice()]);
        candidates.truncate(self.config.candidate_pool);

        let selected = self.diversify(&candidates, memory);
        debug!(
            dense = dense.len(),
            entity = entity.len(),
            candidates = candidates.len(),
            selected = selected.len(),
            "retrieval complete"
        );
        selected
    }
}
