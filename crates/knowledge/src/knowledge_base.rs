//! Document store and the index built from it.
//!
//! Queries read a shared snapshot of the last built index. `build` computes
//! a new index outside the lock and swaps it in, so readers never observe a
//! partially built index and are never blocked by embedding work.

use crate::config::KnowledgeConfig;
use crate::hybrid::{HybridIndex, RankOptions};
use crate::lexical::LexicalOptions;
use crate::semantic::SemanticBackend;
use crate::types::{Chunk, Document, KnowledgeStats, SearchResult};
use compliance_core::AppResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Chunking parameters applied at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSettings {
    pub max_chars: usize,
    pub overlap: usize,
}

pub struct KnowledgeBase {
    chunking: ChunkSettings,
    lexical: LexicalOptions,
    backend: SemanticBackend,
    documents: RwLock<Vec<Document>>,
    index: RwLock<Arc<HybridIndex>>,
    build_lock: Mutex<()>,
    /// Bumped on every document change
    revision: AtomicU64,
    /// Revision the current index was built from
    built_revision: AtomicU64,
}

impl KnowledgeBase {
    pub fn new(chunking: ChunkSettings, lexical: LexicalOptions, backend: SemanticBackend) -> Self {
        Self {
            chunking,
            lexical,
            backend,
            documents: RwLock::new(Vec::new()),
            index: RwLock::new(Arc::new(HybridIndex::empty())),
            build_lock: Mutex::new(()),
            revision: AtomicU64::new(0),
            built_revision: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &KnowledgeConfig, backend: SemanticBackend) -> Self {
        Self::new(
            ChunkSettings {
                max_chars: config.chunk_size,
                overlap: config.chunk_overlap,
            },
            LexicalOptions {
                ngram_max: config.ngram_max,
                max_df: config.max_df,
            },
            backend,
        )
    }

    /// Add documents. A document whose id is already held replaces the old
    /// one in place. The index is stale until the next `build`.
    pub async fn add_documents(&self, incoming: Vec<Document>) -> usize {
        if incoming.is_empty() {
            return 0;
        }

        let count = incoming.len();
        let mut documents = self.documents.write().await;
        for doc in incoming {
            match documents.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => {
                    tracing::info!("Superseding document '{}'", doc.id);
                    *existing = doc;
                }
                None => documents.push(doc),
            }
        }
        self.revision.fetch_add(1, Ordering::SeqCst);

        tracing::debug!("Holding {} documents", documents.len());
        count
    }

    /// Rebuild the whole index from the held documents. Returns the chunk
    /// count.
    pub async fn build(&self) -> AppResult<usize> {
        let _guard = self.build_lock.lock().await;

        let (chunks, revision) = {
            let documents = self.documents.read().await;
            let chunks: Vec<Chunk> = documents
                .iter()
                .flat_map(|doc| doc.chunks(self.chunking.max_chars, self.chunking.overlap))
                .collect();
            (chunks, self.revision.load(Ordering::SeqCst))
        };

        let built = HybridIndex::build(chunks, self.lexical, &self.backend).await?;
        let count = built.len();

        *self.index.write().await = Arc::new(built);
        self.built_revision.store(revision, Ordering::SeqCst);

        Ok(count)
    }

    /// The index currently served to queries.
    pub async fn snapshot(&self) -> Arc<HybridIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Rank the current index against `query`.
    pub async fn search(&self, query: &str, options: &RankOptions) -> Vec<SearchResult> {
        let index = self.snapshot().await;
        if index.is_empty() {
            return Vec::new();
        }

        let embedding = if index.semantic_available() && options.alpha < 1.0 {
            self.backend.embed_query(query).await
        } else {
            None
        };

        let results = index.rank(query, embedding.as_deref(), options);
        tracing::info!("Retrieved {} passages", results.len());
        results
    }

    /// Whether documents changed since the last build.
    pub fn is_stale(&self) -> bool {
        self.revision.load(Ordering::SeqCst) != self.built_revision.load(Ordering::SeqCst)
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn stats(&self) -> KnowledgeStats {
        let index = self.snapshot().await;
        KnowledgeStats {
            documents: self.document_count().await,
            chunks: index.len(),
            semantic_available: index.semantic_available(),
            stale: self.is_stale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(
            ChunkSettings {
                max_chars: 200,
                overlap: 20,
            },
            LexicalOptions::default(),
            SemanticBackend::Unavailable,
        )
    }

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, id, format!("file:///kb/{}", id), text)
    }

    #[tokio::test]
    async fn test_adding_marks_index_stale_until_build() {
        let kb = kb();
        assert!(!kb.is_stale());

        kb.add_documents(vec![doc("aml.md", "Report suspicious activity.")])
            .await;
        assert!(kb.is_stale());
        assert!(kb.search("suspicious", &RankOptions::default()).await.is_empty());

        let chunks = kb.build().await.unwrap();
        assert_eq!(chunks, 1);
        assert!(!kb.is_stale());
        assert_eq!(
            kb.search("suspicious", &RankOptions::default()).await[0].chunk.id,
            "aml.md-0"
        );
    }

    #[tokio::test]
    async fn test_same_id_supersedes() {
        let kb = kb();
        kb.add_documents(vec![doc("a.md", "old text"), doc("b.md", "other")])
            .await;
        kb.add_documents(vec![doc("a.md", "new text")]).await;
        kb.build().await.unwrap();

        let stats = kb.stats().await;
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 2);

        let index = kb.snapshot().await;
        assert_eq!(index.chunks()[0].text, "new text");
    }

    #[tokio::test]
    async fn test_empty_build() {
        let kb = kb();
        assert_eq!(kb.build().await.unwrap(), 0);
        let stats = kb.stats().await;
        assert_eq!(stats.chunks, 0);
        assert!(!stats.semantic_available);
    }

    #[tokio::test]
    async fn test_snapshot_survives_rebuild() {
        let kb = kb();
        kb.add_documents(vec![doc("a.md", "first")]).await;
        kb.build().await.unwrap();
        let before = kb.snapshot().await;

        kb.add_documents(vec![doc("b.md", "second")]).await;
        kb.build().await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(kb.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_searches_during_build() {
        let kb = Arc::new(kb());
        kb.add_documents(vec![doc("a.md", "sanctions screening")])
            .await;
        kb.build().await.unwrap();

        let builder = {
            let kb = Arc::clone(&kb);
            tokio::spawn(async move {
                kb.add_documents(vec![doc("b.md", "sanctions register")])
                    .await;
                kb.build().await.unwrap()
            })
        };
        let searches: Vec<_> = (0..8)
            .map(|_| {
                let kb = Arc::clone(&kb);
                tokio::spawn(async move {
                    kb.search("sanctions", &RankOptions::default()).await.len()
                })
            })
            .collect();

        for search in searches {
            let found = search.await.unwrap();
            assert!(found == 1 || found == 2);
        }
        assert_eq!(builder.await.unwrap(), 2);
    }
}
