// End-to-end query path: expansion -> embedding -> entities -> hybrid retrieval
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Config, EntityPolicy};
use crate::entities::EntityResolver;
use crate::errors::{RagError, Result};
use crate::kb::KnowledgeBase;
use crate::memory::embedding::Embedder;
use crate::memory::{ChunkId, ChunkRecord, EntityCache, EntitySet, MemoryStore};
use crate::nlp::Analyzer;
use crate::rag::expansion::QueryExpander;
use crate::rag::retrieval::RetrievalEngine;

/// One retrieved chunk, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: ChunkId,
    pub text: String,
    pub score: f64,
}

/// Query-side pipeline over a loaded memory.
///
/// Entity resolutions made while querying stay in memory; the cache file is
/// only written by ingest.
pub struct RagPipeline {
    memory: Vec<ChunkRecord>,
    embedder: Arc<dyn Embedder>,
    resolver: EntityResolver,
    expander: QueryExpander,
    engine: RetrievalEngine,
    link_entities: bool,
}

impl RagPipeline {
    pub fn new(
        config: &Config,
        memory: Vec<ChunkRecord>,
        embedder: Arc<dyn Embedder>,
        resolver: EntityResolver,
    ) -> Self {
        let memory_has_entities = memory.iter().any(|r| !r.entities.is_empty());
        Self {
            memory,
            embedder,
            resolver,
            expander: QueryExpander::new(),
            engine: RetrievalEngine::new(config.retrieval.clone()),
            link_entities: memory_has_entities && config.entities.policy != EntityPolicy::Never,
        }
    }

    /// Load the memory file and entity cache named by `config`
    pub fn open(
        config: &Config,
        analyzer: Arc<dyn Analyzer>,
        kb: Arc<dyn KnowledgeBase>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let memory = MemoryStore::new(config.memory_path()).load()?;
        let cache = EntityCache::load(config.entity_cache_path());
        let resolver = EntityResolver::new(analyzer, kb, embedder.clone(), cache, &config.entities);

        info!(records = memory.len(), "memory loaded");
        Ok(Self::new(config, memory, embedder, resolver))
    }

    pub fn memory(&self) -> &[ChunkRecord] {
        &self.memory
    }

    /// Ranked passages for `question`, at most `final_k`
    pub async fn query(&mut self, question: &str) -> Result<Vec<Passage>> {
        if self.memory.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .expander
            .query_vector(self.embedder.as_ref(), question)?;
        let expected = self.memory[0].vector.len();
        if query_vec.len() != expected {
            return Err(RagError::EmbedderFailure(format!(
                "query vector has dimension {}, memory has {}; re-run ingest with the current model",
                query_vec.len(),
                expected
            )));
        }

        let query_entities = if self.link_entities {
            self.resolver.extract(question).await
        } else {
            EntitySet::new()
        };
        debug!(entities = query_entities.len(), "query entities");

        let passages = self
            .engine
            .retrieve(&query_vec, &query_entities, &self.memory)
            .into_iter()
            .filter_map(|hit| {
                self.memory.get(hit.id).map(|record| Passage {
                    id: hit.id,
                    text: record.text.clone(),
                    score: hit.score,
                })
            })
            .collect();

        Ok(passages)
    }
}
