//! Sentence embeddings and the vector math shared by ingest and retrieval

pub mod engine;

pub use engine::EmbeddingEngine;

use crate::errors::{RagError, Result};

/// Batch text encoder producing fixed-dimension vectors
pub trait Embedder: Send + Sync {
    /// Encode `texts` in order; one vector per input
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Output dimension
    fn dimension(&self) -> usize;
}

/// Embed `texts` and L2-normalize every vector.
///
/// Fails with `EmbedderFailure` when the embedder drops or adds vectors or
/// returns a vector of the wrong dimension.
pub fn embed_normalized(embedder: &dyn Embedder, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let mut vectors = embedder.embed(texts)?;
    if vectors.len() != texts.len() {
        return Err(RagError::EmbedderFailure(format!(
            "expected {} vectors, got {}",
            texts.len(),
            vectors.len()
        )));
    }

    let dimension = embedder.dimension();
    for vector in vectors.iter_mut() {
        if vector.len() != dimension {
            return Err(RagError::EmbedderFailure(format!(
                "expected dimension {}, got {}",
                dimension,
                vector.len()
            )));
        }
        normalize(vector);
    }

    Ok(vectors)
}

/// Scale `vector` to unit length in place; zero vectors stay zero
pub fn normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value = (*value as f64 / norm) as f32;
        }
    }
}

fn l2_norm(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|v| (*v as f64) * (*v as f64))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity; 0.0 when either side is a zero vector
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    (dot / (norm_a * norm_b)) as f32
}

/// Component-wise mean of equally sized vectors, re-normalized
pub fn mean_normalized(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut mean = vec![0.0f64; first.len()];
    for vector in vectors {
        for (acc, value) in mean.iter_mut().zip(vector.iter()) {
            *acc += *value as f64;
        }
    }

    let count = vectors.len() as f64;
    let mut mean: Vec<f32> = mean.into_iter().map(|v| (v / count) as f32).collect();
    normalize(&mut mean);
    Some(mean)
}
