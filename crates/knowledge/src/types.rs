//! Knowledge system type definitions.

use crate::chunker::chunk_text;
use serde::{Deserialize, Serialize};

/// A source document as ingested.
///
/// Documents are never edited in place; re-ingesting a document with the
/// same id replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier (the file name for file sources)
    pub id: String,

    /// Display title
    pub title: String,

    /// Provenance URI, e.g. `file:///abs/path.md`
    pub source_uri: String,

    /// Extracted text
    pub raw_text: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_uri: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_uri: source_uri.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Split the document into chunks with ids `<document id>-<ordinal>`.
    pub fn chunks(&self, max_chars: usize, overlap: usize) -> Vec<Chunk> {
        chunk_text(&self.raw_text, max_chars, overlap)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk {
                id: format!("{}-{}", self.id, ordinal),
                parent_document_id: self.id.clone(),
                title: self.title.clone(),
                source_uri: self.source_uri.clone(),
                text,
                ordinal: ordinal as u32,
            })
            .collect()
    }
}

/// A bounded passage of a document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within an index
    pub id: String,

    /// Back-reference for provenance display
    pub parent_document_id: String,

    pub title: String,

    pub source_uri: String,

    pub text: String,

    /// Reading order within the parent document
    pub ordinal: u32,
}

/// A chunk scored against one query.
///
/// Scores are only comparable within the same query and index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub chunk: Chunk,

    pub score: f32,
}

/// Snapshot of knowledge base state for `stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    /// Number of documents held
    pub documents: usize,

    /// Number of chunks in the built index
    pub chunks: usize,

    /// Whether the built index carries embeddings
    pub semantic_available: bool,

    /// Documents were added since the last build
    pub stale: bool,
}
