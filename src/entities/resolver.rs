// Span -> knowledge-base id resolution with caching and context disambiguation
use std::sync::Arc;
use tracing::debug;

use crate::config::EntityConfig;
use crate::kb::{KbCandidate, KnowledgeBase};
use crate::memory::embedding::{cosine_similarity, embed_normalized, Embedder};
use crate::memory::{CacheLookup, Entity, EntityCache, EntitySet};
use crate::nlp::{Analyzer, EntitySpan};

/// Counters for one resolver lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub kb_lookups: usize,
    pub kb_failures: usize,
    pub unresolved: usize,
}

/// Extracts entity tags from text.
///
/// Owns the entity cache for the duration of a run; call `save_cache` at the
/// end of ingest to persist new resolutions.
pub struct EntityResolver {
    analyzer: Arc<dyn Analyzer>,
    kb: Arc<dyn KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    cache: EntityCache,
    candidate_limit: usize,
    cache_negative_results: bool,
    stats: ResolverStats,
}

impl EntityResolver {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        kb: Arc<dyn KnowledgeBase>,
        embedder: Arc<dyn Embedder>,
        cache: EntityCache,
        config: &EntityConfig,
    ) -> Self {
        Self {
            analyzer,
            kb,
            embedder,
            cache,
            candidate_limit: config.kb_candidates,
            cache_negative_results: config.cache_negative_results,
            stats: ResolverStats::default(),
        }
    }

    /// All entity tags found in `text`
    pub async fn extract(&mut self, text: &str) -> EntitySet {
        let analysis = self.analyzer.analyze(text);
        let mut entities = EntitySet::new();

        for span in analysis.entities {
            if !span.label.is_relevant() {
                continue;
            }

            if span.label.is_text_kind() {
                entities.insert(Entity::text(&span.text));
                continue;
            }

            if let Some(id) = self.resolve_span(&span).await {
                entities.insert(Entity::Wiki(id));
            }
        }

        entities
    }

    async fn resolve_span(&mut self, span: &EntitySpan) -> Option<String> {
        let context = Some(span.sentence.as_str()).filter(|s| !s.trim().is_empty());
        self.resolve(&span.text, context).await
    }

    /// Resolve one surface string to a knowledge-base id.
    ///
    /// `sentence` is the disambiguation context; the surface itself is used
    /// when absent. Failures of any kind yield `None` and are not cached.
    pub async fn resolve(&mut self, surface: &str, sentence: Option<&str>) -> Option<String> {
        match self.cache.lookup(surface) {
            CacheLookup::Hit(id) => {
                self.stats.cache_hits += 1;
                return Some(id);
            }
            CacheLookup::KnownMiss if self.cache_negative_results => {
                self.stats.cache_hits += 1;
                self.stats.unresolved += 1;
                return None;
            }
            CacheLookup::KnownMiss | CacheLookup::Miss => {}
        }

        self.stats.kb_lookups += 1;
        let candidates = match self.kb.search(surface, self.candidate_limit).await {
            Ok(candidates) => candidates,
            Err(e) => {
                self.stats.kb_failures += 1;
                debug!(surface, error = %e, "KB lookup failed; span left unresolved");
                return None;
            }
        };

        if candidates.is_empty() {
            self.stats.unresolved += 1;
            if self.cache_negative_results {
                self.cache.store(surface, None);
            }
            debug!(surface, "no KB candidates");
            return None;
        }

        let context = sentence.unwrap_or(surface);
        let chosen = self.disambiguate(context, &candidates)?;
        debug!(surface, id = %chosen, "entity resolved");
        self.cache.store(surface, Some(chosen.clone()));
        Some(chosen)
    }

    /// Candidate whose gloss is closest to `context`; earliest wins ties
    fn disambiguate(&self, context: &str, candidates: &[KbCandidate]) -> Option<String> {
        if candidates.len() == 1 {
            return Some(candidates[0].id.clone());
        }

        let mut texts: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
        texts.push(context);
        texts.extend(candidates.iter().map(KbCandidate::gloss));

        let vectors = match embed_normalized(self.embedder.as_ref(), &texts) {
            Ok(vectors) => vectors,
            Err(e) => {
                debug!(error = %e, "disambiguation embedding failed");
                return None;
            }
        };

        let (context_vec, candidate_vecs) = vectors.split_first()?;
        let mut best: Option<(usize, f32)> = None;
        for (index, vector) in candidate_vecs.iter().enumerate() {
            let score = cosine_similarity(context_vec, vector);
            if best.map(|(_, top)| score > top).unwrap_or(true) {
                best = Some((index, score));
            }
        }

        best.map(|(index, _)| candidates[index].id.clone())
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Persist the cache to its backing file
    pub fn save_cache(&mut self) -> crate::errors::Result<()> {
        self.cache.save()
    }
}
