//! Hybrid lexical + semantic ranking with optional fuzzy rerank.

use crate::fuzzy::partial_ratio;
use crate::lexical::{top_k, LexicalIndex, LexicalOptions};
use crate::semantic::{SemanticBackend, SemanticIndex};
use crate::types::{Chunk, SearchResult};
use compliance_core::{AppError, AppResult};

/// Per-query ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Results returned
    pub k: usize,

    /// Lexical weight: `alpha * lexical + (1 - alpha) * semantic`
    pub alpha: f32,

    /// Reorder the selected results by fuzzy similarity to the query
    pub rerank: bool,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            k: 5,
            alpha: 0.5,
            rerank: true,
        }
    }
}

/// Chunks plus the numeric structures derived from them, index-aligned.
///
/// Immutable once built; a rebuild produces a new value.
#[derive(Debug, Clone, Default)]
pub struct HybridIndex {
    chunks: Vec<Chunk>,
    lexical: LexicalIndex,
    semantic: SemanticIndex,
}

impl HybridIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fit the lexical index and embed every chunk.
    pub async fn build(
        chunks: Vec<Chunk>,
        options: LexicalOptions,
        backend: &SemanticBackend,
    ) -> AppResult<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let lexical = LexicalIndex::fit(&texts, options);
        let semantic = SemanticIndex::build(backend, &texts).await;

        if lexical.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Lexical index holds {} rows for {} chunks",
                lexical.len(),
                chunks.len()
            )));
        }
        if semantic.is_available() && semantic.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Semantic index holds {} rows for {} chunks",
                semantic.len(),
                chunks.len()
            )));
        }

        tracing::info!(
            "Built index: {} chunks, {} terms, semantic {}",
            chunks.len(),
            lexical.vocabulary_size(),
            if semantic.is_available() { "on" } else { "off" }
        );

        Ok(Self {
            chunks,
            lexical,
            semantic,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn semantic_available(&self) -> bool {
        self.semantic.is_available()
    }

    /// Rank chunks against `query`.
    ///
    /// Ties keep insertion order. The fuzzy rerank only reorders the
    /// selected top `k`.
    pub fn rank(
        &self,
        query: &str,
        query_embedding: Option<&[f32]>,
        options: &RankOptions,
    ) -> Vec<SearchResult> {
        if self.chunks.is_empty() || options.k == 0 {
            return Vec::new();
        }

        let n = self.chunks.len();
        let lexical = self.lexical.scores(query);
        let semantic = self.semantic.scores(query_embedding, n);

        let combined: Vec<f32> = lexical
            .iter()
            .zip(&semantic)
            .map(|(lex, sem)| options.alpha * lex + (1.0 - options.alpha) * sem)
            .collect();

        let selected = top_k(&combined, options.k);
        tracing::debug!(
            "Top scores: {:?}",
            selected.iter().map(|(s, _)| *s).collect::<Vec<_>>()
        );

        let mut results: Vec<SearchResult> = selected
            .into_iter()
            .map(|(score, index)| SearchResult {
                chunk: self.chunks[index].clone(),
                score,
            })
            .collect();

        if options.rerank {
            rerank_fuzzy(query, &mut results);
        }

        results
    }
}

/// Stable reorder by descending partial ratio against the raw query.
pub fn rerank_fuzzy(query: &str, results: &mut Vec<SearchResult>) {
    let mut keyed: Vec<(f32, SearchResult)> = results
        .drain(..)
        .map(|r| (partial_ratio(query, &r.chunk.text), r))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    results.extend(keyed.into_iter().map(|(_, r)| r));
}
