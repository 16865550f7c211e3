//! Ingest invariants, persistence, and retrieval properties

mod common;

use quickcheck_macros::quickcheck;
use std::sync::Arc;
use tempfile::TempDir;

use common::{test_config, write_source, HashEmbedder, StubKnowledgeBase, TableAnalyzer};
use elerag::config::{EntityPolicy, RetrievalConfig};
use elerag::ingest::{Ingestor, SmartChunker, SourceMode};
use elerag::kb::KbCandidate;
use elerag::memory::embedding::cosine_similarity;
use elerag::memory::{CacheLookup, ChunkRecord, Entity, EntityCache, EntitySet, MemoryStore};
use elerag::nlp::{EntityLabel, HeuristicAnalyzer};
use elerag::rag::RetrievalEngine;

const CORPUS: &str = "Unit,Subtopic,Fact\n\
History,Paris,The Eiffel Tower was completed in March 1889 for the World Fair.\n\
History,Paris,Gustave Eiffel designed the Eiffel Tower with Maurice Koechlin.\n\
Art,Museums,The Louvre in Paris houses the Mona Lisa by Leonardo da Vinci.\n\
Tech,Phones,Apple released the first iPhone in June 2007.\n\
Tech,Phones,Apple released the first iPhone in June 2007.\n\
Misc,,tiny\n";

fn corpus_analyzer() -> TableAnalyzer {
    TableAnalyzer::new(&[
        ("Eiffel Tower", EntityLabel::Fac),
        ("Gustave Eiffel", EntityLabel::Person),
        ("Paris", EntityLabel::Gpe),
        ("Louvre", EntityLabel::Org),
        ("Apple", EntityLabel::Org),
        ("iPhone", EntityLabel::Product),
        ("March 1889", EntityLabel::Date),
        ("June 2007", EntityLabel::Date),
    ])
}

fn corpus_kb() -> StubKnowledgeBase {
    StubKnowledgeBase::new()
        .with("Gustave Eiffel", vec![KbCandidate::new("Q20882", "Gustave Eiffel", None)])
        .with("Paris", vec![KbCandidate::new("Q90", "Paris", Some("capital of France"))])
        .with("Louvre", vec![KbCandidate::new("Q19675", "Louvre", Some("art museum in Paris"))])
        .with("Apple", vec![KbCandidate::new("Q312", "Apple Inc.", None)])
}

async fn ingest(dir: &std::path::Path) -> (elerag::config::Config, elerag::ingest::IngestReport) {
    let config = test_config(dir);
    let source = write_source(dir, "corpus.csv", CORPUS);
    let report = Ingestor::new(
        config.clone(),
        Arc::new(corpus_analyzer()),
        Arc::new(corpus_kb()),
        Arc::new(HashEmbedder),
    )
    .ingest(&source, SourceMode::Auto)
    .await
    .unwrap();
    (config, report)
}

#[tokio::test]
async fn records_are_ordered_normalized_and_tagged() {
    let dir = TempDir::new().unwrap();
    let (config, report) = ingest(dir.path()).await;

    assert_eq!(report.chunks, 4);
    assert_eq!(report.load.duplicates, 1);
    assert_eq!(report.load.too_short, 1);

    let memory = MemoryStore::new(config.memory_path()).load().unwrap();
    for (index, record) in memory.iter().enumerate() {
        assert_eq!(record.id, index);
        let norm: f32 = record.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "record {} has norm {}", index, norm);
        for entity in &record.entities {
            assert!(matches!(entity.kind(), "wiki" | "text"));
            if let Entity::Text(value) = entity {
                assert_eq!(value, &value.to_lowercase());
            }
        }
        assert!(record.text.chars().count() >= config.chunking.min_chunk_chars);
    }

    assert!(memory[0].entities.contains(&Entity::text("March 1889")));
    assert!(memory[0].entities.contains(&Entity::Wiki("Q90".to_string())));
    assert!(memory[1].entities.contains(&Entity::Wiki("Q20882".to_string())));
    assert!(memory[3].entities.contains(&Entity::text("iPhone")));
    assert_eq!(report.chunks_with_entities, 4);
}

#[tokio::test]
async fn memory_file_is_plain_json_with_entity_pairs() {
    let dir = TempDir::new().unwrap();
    let (config, _) = ingest(dir.path()).await;

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(config.memory_path()).unwrap()).unwrap();
    let first = &raw.as_array().unwrap()[0];
    assert_eq!(first["id"], 0);
    assert!(first["vector"].is_array());
    let pairs = first["entities"].as_array().unwrap();
    assert!(pairs.iter().all(|p| p.as_array().map(|a| a.len() == 2).unwrap_or(false)));
    assert!(!dir.path().join("pi_memory.json.tmp").exists());
}

#[tokio::test]
async fn ingest_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (config, _) = ingest(dir.path()).await;
    let first = std::fs::read(config.memory_path()).unwrap();

    let (config, _) = ingest(dir.path()).await;
    let second = std::fs::read(config.memory_path()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn entity_cache_persists_and_skips_kb_on_next_run() {
    let dir = TempDir::new().unwrap();
    let (config, _) = ingest(dir.path()).await;

    let cache = EntityCache::load(config.entity_cache_path());
    assert_eq!(cache.lookup("Paris"), CacheLookup::Hit("Q90".to_string()));
    assert_eq!(cache.lookup("Eiffel Tower"), CacheLookup::Miss);

    let kb = Arc::new(corpus_kb());
    let source = dir.path().join("corpus.csv");
    Ingestor::new(config.clone(), Arc::new(corpus_analyzer()), kb.clone(), Arc::new(HashEmbedder))
        .ingest(&source, SourceMode::Auto)
        .await
        .unwrap();

    assert_eq!(kb.calls(), 0);
}

#[tokio::test]
async fn large_corpus_skips_entities_under_threshold_policy() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.entities.policy = EntityPolicy::BelowThreshold;
    config.entities.use_entities_threshold = 3;

    let source = write_source(dir.path(), "corpus.csv", CORPUS);
    let kb = Arc::new(corpus_kb());
    let report = Ingestor::new(config.clone(), Arc::new(corpus_analyzer()), kb.clone(), Arc::new(HashEmbedder))
        .ingest(&source, SourceMode::Auto)
        .await
        .unwrap();

    assert!(!report.entities_enabled);
    assert_eq!(report.chunks_with_entities, 0);
    assert_eq!(kb.calls(), 0);
    assert!(!config.entity_cache_path().exists());
}

#[tokio::test]
async fn prose_file_ingests_overlapping_chunks() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.chunking.chunk_size_words = 12;
    config.chunking.overlap_words = 4;

    let text = "The Eiffel Tower stands in Paris near the Seine. \
                It was designed by the engineering company of Gustave Eiffel. \
                Construction finished in March 1889 after two years. \
                Millions of visitors climb the tower every single year.";
    let source = write_source(dir.path(), "tower.txt", text);

    let report = Ingestor::new(
        config.clone(),
        Arc::new(TableAnalyzer::empty()),
        Arc::new(StubKnowledgeBase::new()),
        Arc::new(HashEmbedder),
    )
    .ingest(&source, SourceMode::Prose)
    .await
    .unwrap();

    let memory = MemoryStore::new(config.memory_path()).load().unwrap();
    assert_eq!(report.chunks, memory.len());
    assert!(memory.len() >= 3);
    assert!(memory[0].text.starts_with("The Eiffel Tower stands in Paris"));
}

#[test]
fn adjacent_chunks_share_a_sentence() {
    let sentences: Vec<String> = (0..8)
        .map(|i| format!("Sentence {} has exactly five words.", i))
        .collect();
    let text = sentences.join(" ");

    let chunks = SmartChunker::new(20, 5).chunk(&HeuristicAnalyzer::new(), &text);
    assert!(chunks.len() >= 2);
    for pair in chunks.windows(2) {
        let shared = sentences
            .iter()
            .any(|s| pair[0].contains(s.as_str()) && pair[1].contains(s.as_str()));
        assert!(shared, "no shared sentence between {:?} and {:?}", pair[0], pair[1]);
    }
}

fn random_memory(seeds: &[(i8, i8, i8, bool)]) -> Vec<ChunkRecord> {
    seeds
        .iter()
        .take(40)
        .enumerate()
        .map(|(id, (a, b, c, tagged))| {
            let entities: EntitySet = if *tagged {
                [Entity::Wiki("Q1".to_string())].into_iter().collect()
            } else {
                EntitySet::new()
            };
            ChunkRecord::new(id, format!("chunk {}", id), vec![*a as f32, *b as f32, *c as f32], entities)
        })
        .collect()
}

#[quickcheck]
fn empty_query_entities_match_dense_only(seeds: Vec<(i8, i8, i8, bool)>) -> bool {
    let memory = random_memory(&seeds);
    let engine = RetrievalEngine::new(RetrievalConfig::default());
    let query = [0.3, -0.2, 0.9];

    let hybrid = engine.retrieve(&query, &EntitySet::new(), &memory);

    let dense = engine.dense_rank(&query, &memory);
    let mut candidates = RetrievalEngine::fuse(&[dense.as_slice()]);
    candidates.truncate(engine.config().candidate_pool);
    let dense_only = engine.diversify(&candidates, &memory);

    hybrid == dense_only
}

#[quickcheck]
fn retrieved_passages_are_pairwise_diverse(seeds: Vec<(i8, i8, i8, bool)>) -> bool {
    let memory = random_memory(&seeds);
    let engine = RetrievalEngine::new(RetrievalConfig::default());
    let entities: EntitySet = [Entity::Wiki("Q1".to_string())].into_iter().collect();
    let result = engine.retrieve(&[1.0, 1.0, 0.0], &entities, &memory);

    result.len() <= engine.config().final_k
        && result.iter().enumerate().all(|(i, a)| {
            result[i + 1..].iter().all(|b| {
                cosine_similarity(&memory[a.id].vector, &memory[b.id].vector)
                    <= engine.config().diversity_threshold
            })
        })
}

#[quickcheck]
fn rrf_score_falls_with_rank(len: u8) -> bool {
    let ids: Vec<usize> = (0..(len as usize % 50) + 2).collect();
    let fused = RetrievalEngine::fuse(&[ids.as_slice()]);
    fused.windows(2).all(|w| w[0].score > w[1].score && w[0].id < w[1].id)
}

#[test]
fn resolution_repeats_within_a_run() {
    let analyzer = Arc::new(corpus_analyzer());
    let kb = Arc::new(corpus_kb());
    let config = test_config(std::path::Path::new("."));
    let mut resolver = elerag::entities::EntityResolver::new(
        analyzer,
        kb.clone(),
        Arc::new(HashEmbedder),
        EntityCache::new(),
        &config.entities,
    );

    let ids: Vec<Option<String>> = (0..3)
        .map(|_| tokio_test::block_on(resolver.resolve("Louvre", Some("The Louvre in Paris."))))
        .collect();

    assert!(ids.iter().all(|id| id.as_deref() == Some("Q19675")));
    assert_eq!(kb.calls(), 1);
}
