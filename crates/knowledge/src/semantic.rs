//! Dense-vector similarity over chunk texts.
//!
//! Embeddings are optional. Whenever they are missing the index scores
//! every chunk zero, so hybrid ranking falls back to lexical scores.

use crate::embeddings::EmbeddingProvider;
use crate::lexical::top_k;
use std::sync::Arc;

/// Whether an embedding model can be used.
#[derive(Debug, Clone)]
pub enum SemanticBackend {
    Available(Arc<dyn EmbeddingProvider>),
    Unavailable,
}

impl SemanticBackend {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Embed a query. `None` when unavailable or when the provider fails.
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let Self::Available(provider) = self else {
            return None;
        };
        match provider.embed(text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Query embedding failed, using lexical scores only: {}", e);
                None
            }
        }
    }
}

/// Row-normalised embedding matrix, aligned with the chunk list.
#[derive(Debug, Clone, Default)]
pub struct SemanticIndex {
    matrix: Option<Vec<Vec<f32>>>,
}

impl SemanticIndex {
    /// An index that abstains on every query.
    pub fn unavailable() -> Self {
        Self { matrix: None }
    }

    /// Embed `texts`. Any failure leaves the index unavailable.
    pub async fn build(backend: &SemanticBackend, texts: &[String]) -> Self {
        let SemanticBackend::Available(provider) = backend else {
            return Self::unavailable();
        };
        if texts.is_empty() {
            return Self {
                matrix: Some(Vec::new()),
            };
        }

        match provider.embed_batch(texts).await {
            Ok(rows) if rows.len() == texts.len() => {
                tracing::debug!(
                    "Embedded {} chunks with '{}'",
                    rows.len(),
                    provider.provider_name()
                );
                Self {
                    matrix: Some(rows.into_iter().map(normalize).collect()),
                }
            }
            Ok(rows) => {
                tracing::warn!(
                    "Embedding provider returned {} vectors for {} chunks; semantic index disabled",
                    rows.len(),
                    texts.len()
                );
                Self::unavailable()
            }
            Err(e) => {
                tracing::warn!("Failed to embed chunks; semantic index disabled: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.matrix.is_some()
    }

    /// Rows held; zero when unavailable.
    pub fn len(&self) -> usize {
        self.matrix.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cosine similarity of the query against each of `n` chunks.
    ///
    /// Zeros when the index or query is missing, or when the query
    /// dimension differs from the matrix.
    pub fn scores(&self, query: Option<&[f32]>, n: usize) -> Vec<f32> {
        let (Some(matrix), Some(query)) = (&self.matrix, query) else {
            return vec![0.0; n];
        };
        if matrix.len() != n {
            return vec![0.0; n];
        }

        let norm = l2_norm(query);
        if norm == 0.0 {
            return vec![0.0; n];
        }
        matrix
            .iter()
            .map(|row| {
                if row.len() != query.len() {
                    0.0
                } else {
                    row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>() / norm
                }
            })
            .collect()
    }

    /// Top `k` chunks as `(score, index)`, ties in insertion order.
    pub fn query(&self, query: Option<&[f32]>, n: usize, k: usize) -> Vec<(f32, usize)> {
        top_k(&self.scores(query, n), k)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
