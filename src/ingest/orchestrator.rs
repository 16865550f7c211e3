// Ingest pipeline: load -> embed -> enrich -> persist
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::loader::{LoadStats, SourceLoader, SourceMode};
use crate::config::Config;
use crate::entities::{EntityResolver, ResolverStats};
use crate::errors::Result;
use crate::kb::KnowledgeBase;
use crate::memory::embedding::{embed_normalized, Embedder};
use crate::memory::{ChunkRecord, EntityCache, EntitySet, MemoryStore};
use crate::nlp::Analyzer;

/// Summary of one ingest run
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub chunks: usize,
    pub chunks_with_entities: usize,
    pub entities_enabled: bool,
    pub memory_path: PathBuf,
    pub load: LoadStats,
    pub resolver: Option<ResolverStats>,
}

/// Drives a full ingest and replaces the memory file on success
pub struct Ingestor {
    config: Config,
    analyzer: Arc<dyn Analyzer>,
    kb: Arc<dyn KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(
        config: Config,
        analyzer: Arc<dyn Analyzer>,
        kb: Arc<dyn KnowledgeBase>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            analyzer,
            kb,
            embedder,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn ingest(&self, path: &Path, mode: SourceMode) -> Result<IngestReport> {
        let loader = SourceLoader::new(self.config.chunking.clone(), self.analyzer.clone());
        let loaded = loader.load(path, mode)?;
        let chunks = loaded.chunks;

        if chunks.is_empty() {
            warn!(path = %path.display(), "source produced no chunks; memory will be empty");
        }

        let vectors = self.embed_all(&chunks)?;

        let entities_enabled = self.config.entities.enabled_for(chunks.len());
        let mut resolver = None;
        let entity_sets: Vec<EntitySet> = if entities_enabled {
            let cache = EntityCache::load(self.config.entity_cache_path());
            let mut active = EntityResolver::new(
                self.analyzer.clone(),
                self.kb.clone(),
                self.embedder.clone(),
                cache,
                &self.config.entities,
            );

            let bar = self.progress_bar(chunks.len(), "Linking entities");
            let mut sets = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                sets.push(active.extract(chunk).await);
                bar.inc(1);
            }
            bar.finish_and_clear();

            resolver = Some(active);
            sets
        } else {
            info!(
                chunks = chunks.len(),
                threshold = self.config.entities.use_entities_threshold,
                "entity enrichment skipped for this corpus size"
            );
            vec![EntitySet::new(); chunks.len()]
        };

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(vectors)
            .zip(entity_sets)
            .enumerate()
            .map(|(id, ((text, vector), entities))| ChunkRecord::new(id, text, vector, entities))
            .collect();
        let chunks_with_entities = records.iter().filter(|r| !r.entities.is_empty()).count();

        let store = MemoryStore::new(self.config.memory_path());
        store.save(&records)?;

        let resolver_stats = match resolver.as_mut() {
            Some(active) => {
                active.save_cache()?;
                Some(active.stats())
            }
            None => None,
        };

        info!(
            chunks = records.len(),
            chunks_with_entities,
            memory = %store.path().display(),
            "ingest complete"
        );

        Ok(IngestReport {
            chunks: records.len(),
            chunks_with_entities,
            entities_enabled,
            memory_path: store.path().to_path_buf(),
            load: loaded.stats,
            resolver: resolver_stats,
        })
    }

    fn embed_all(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        let bar = self.progress_bar(chunks.len(), "Embedding");
        let batch_size = self.config.embedding.batch_size.max(1);

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
            vectors.extend(embed_normalized(self.embedder.as_ref(), &texts)?);
            bar.inc(batch.len() as u64);
        }

        bar.finish_and_clear();
        Ok(vectors)
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} | ETA: {eta}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(label.to_string());
        pb
    }
}
