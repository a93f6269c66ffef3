//! TF-IDF vector space over chunk texts.
//!
//! Rows are L2-normalised, so cosine similarity reduces to a sparse dot
//! product.

use crate::chunker::normalize_whitespace;
use std::collections::HashMap;

/// Sparse row: (term index, weight), sorted by term index.
type SparseVector = Vec<(usize, f32)>;

/// Vectorizer options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalOptions {
    /// Largest n-gram (1 = unigrams only)
    pub ngram_max: usize,

    /// Terms in more than this fraction of documents are dropped
    pub max_df: f32,
}

impl Default for LexicalOptions {
    fn default() -> Self {
        Self {
            ngram_max: 2,
            max_df: 1.0,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Lowercase, collapse whitespace and extract 1..=ngram_max grams.
///
/// Tokens are runs of two or more word characters.
pub fn analyze(text: &str, ngram_max: usize) -> Vec<String> {
    let normalized = normalize_whitespace(&text.to_lowercase());
    let tokens: Vec<&str> = normalized
        .split(|c: char| !is_word_char(c))
        .filter(|token| token.chars().nth(1).is_some())
        .collect();

    let mut terms = Vec::with_capacity(tokens.len() * ngram_max.max(1));
    for n in 1..=ngram_max.max(1) {
        if tokens.len() < n {
            break;
        }
        terms.extend(tokens.windows(n).map(|gram| gram.join(" ")));
    }
    terms
}

/// Fitted TF-IDF index.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    options: LexicalOptions,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Fit the vocabulary and document vectors on `corpus`.
    pub fn fit<S: AsRef<str>>(corpus: &[S], options: LexicalOptions) -> Self {
        let documents: Vec<Vec<String>> = corpus
            .iter()
            .map(|text| analyze(text.as_ref(), options.ngram_max))
            .collect();
        let n_docs = documents.len();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for terms in &documents {
            let mut seen: Vec<&str> = terms.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let ceiling = options.max_df as f64 * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df <= 1 || (*df as f64) <= ceiling)
            .collect();
        // Sorted vocabulary keeps term indices deterministic
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, df)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            idf.push((((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0);
        }

        let mut index = Self {
            options,
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        let rows = documents.iter().map(|terms| index.vectorize(terms)).collect();
        index.rows = rows;

        tracing::debug!(
            "Fitted lexical index: {} documents, {} terms",
            n_docs,
            index.vocabulary.len()
        );

        index
    }

    fn vectorize(&self, terms: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        row.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine similarity of `text` against every document, in corpus order.
    pub fn scores(&self, text: &str) -> Vec<f32> {
        let query = self.vectorize(&analyze(text, self.options.ngram_max));
        if query.is_empty() {
            return vec![0.0; self.rows.len()];
        }
        self.rows.iter().map(|row| sparse_dot(&query, row)).collect()
    }

    /// Top `k` documents as `(score, index)`, best first, ties in corpus order.
    pub fn query(&self, text: &str, k: usize) -> Vec<(f32, usize)> {
        top_k(&self.scores(text), k)
    }
}

fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Stable descending selection of the best `k` scores.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(f32, usize)> {
    let mut ranked: Vec<(f32, usize)> = scores
        .iter()
        .enumerate()
        .map(|(index, score)| (*score, index))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(k);
    ranked
}
