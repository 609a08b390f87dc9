use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use parking_lot::RwLock;
use uuid::Uuid;

use localrag_core::cancel::CancelToken;
use localrag_core::chunker::Chunker;
use localrag_core::config::{expand_path, RagConfig};
use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use localrag_core::types::{Document, Passage, PassageId};
use localrag_vector::VectorIndex;

use crate::context::ContextBlender;
use crate::embed::embed_with_timeout;
use crate::rank::rank_documents;
use crate::snapshot;

/// A passage returned together with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Chunks, embeds and indexes documents; answers top-k passage queries.
///
/// Embedding calls run outside every lock. Passage records and index entries
/// are updated together under the passage map's write lock, so a reader never
/// resolves a hit to a missing record except after a concurrent `remove`.
pub struct DocumentStore {
    chunker: Chunker,
    index: VectorIndex,
    passages: RwLock<HashMap<PassageId, Passage>>,
    embedder: Arc<dyn Embedder>,
    embed_concurrency: usize,
    embed_timeout: Option<Duration>,
    snapshot_path: Option<PathBuf>,
    top_k: usize,
    blender: ContextBlender,
    budget: usize,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("embedder", &self.embedder.name())
            .field("passages", &self.index.len())
            .field("snapshot_path", &self.snapshot_path)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Empty store. An existing snapshot is ignored; see [`DocumentStore::open`].
    pub fn new(config: &RagConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunker: Chunker::new(config.chunking.clone())?,
            index: VectorIndex::new(),
            passages: RwLock::new(HashMap::new()),
            embedder,
            embed_concurrency: config.store.embed_concurrency,
            embed_timeout: config.store.embed_timeout(),
            snapshot_path: config.store.snapshot_path.as_deref().map(expand_path),
            top_k: config.retrieval.top_k,
            blender: ContextBlender::new(&config.blend)?,
            budget: config.blend.budget,
        })
    }

    /// Like `new`, then loads the configured snapshot if it exists.
    pub fn open(config: &RagConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = Self::new(config, embedder)?;
        if let Some(path) = store.snapshot_path.clone() {
            if path.exists() {
                store.load_from(&path)?;
            } else {
                tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
            }
        }
        Ok(store)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub async fn store(&self, text: &str) -> Result<Vec<PassageId>> {
        self.store_with_cancel(text, &CancelToken::new()).await
    }

    /// Chunk `text`, embed every chunk and index the resulting passages.
    ///
    /// Returns the new passage ids in chunk order. On failure the passages
    /// inserted before the failing chunk stay in the store.
    pub async fn store_with_cancel(
        &self,
        text: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<PassageId>> {
        let doc = Document { id: Uuid::new_v4().simple().to_string(), raw_text: text };
        let chunks = self.chunker.chunk(doc.raw_text);

        let mut embedded = pin!(stream::iter(chunks.enumerate())
            .map(move |(seq, chunk)| async move {
                cancel.check()?;
                let embedding = self.embed(&chunk.text).await?;
                tracing::debug!(
                    seq,
                    start = chunk.start_offset,
                    end = chunk.end_offset,
                    "chunk embedded"
                );
                Ok::<_, Error>((seq, chunk, embedding))
            })
            .buffered(self.embed_concurrency));

        let mut ids = Vec::new();
        while let Some(next) = embedded.next().await {
            let (seq, chunk, embedding) = match next {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(
                        doc_id = %doc.id,
                        kept = ids.len(),
                        error = %e,
                        "store stopped early"
                    );
                    return Err(e);
                }
            };
            let passage = Passage {
                id: format!("{}:{}", doc.id, seq),
                embedding,
                text: chunk.text,
                source_doc_id: doc.id.clone(),
                offset: chunk.start_offset,
            };
            ids.push(self.insert(passage)?);
        }

        tracing::info!(
            doc_id = %doc.id,
            passages = ids.len(),
            bytes = text.len(),
            "document stored"
        );
        Ok(ids)
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        self.retrieve_with_cancel(query, k, &CancelToken::new()).await
    }

    /// Up to `k` passages most similar to `query`, best first.
    pub async fn retrieve_with_cancel(
        &self,
        query: &str,
        k: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Passage>> {
        Ok(self
            .retrieve_scored(query, k, cancel)
            .await?
            .into_iter()
            .map(|hit| hit.passage)
            .collect())
    }

    pub async fn retrieve_scored(
        &self,
        query: &str,
        k: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredPassage>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        cancel.check()?;
        let embedding = self.embed(query).await?;
        cancel.check()?;

        let hits = self.index.search(&embedding, k)?;
        let passages = self.passages.read();
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let passage = passages.get(&hit.id)?.clone();
                Some(ScoredPassage { passage, score: hit.score })
            })
            .collect())
    }

    /// Retrieve `retrieval.top_k` passages for `query` and blend them with
    /// the configured blender into at most `blend.budget` units.
    pub async fn build_context(&self, query: &str) -> Result<String> {
        self.build_context_with(query, self.top_k, &self.blender, self.budget).await
    }

    pub async fn build_context_with(
        &self,
        query: &str,
        k: usize,
        blender: &ContextBlender,
        budget: usize,
    ) -> Result<String> {
        let ranked = self.retrieve(query, k).await?;
        Ok(blender.blend(&ranked, budget))
    }

    /// Rank caller-supplied texts against `query` with this store's embedder
    /// and timeout, without storing them.
    pub async fn rank<S>(&self, query: &str, docs: &[S]) -> Result<Vec<(usize, f32)>>
    where
        S: AsRef<str> + Sync,
    {
        rank_documents(self.embedder.as_ref(), query, docs, self.embed_timeout).await
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn passage(&self, id: &str) -> Result<Passage> {
        self.passages
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("passage {id}")))
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut passages = self.passages.write();
        if passages.remove(id).is_none() {
            return Err(Error::NotFound(format!("passage {id}")));
        }
        self.index.remove(id);
        Ok(())
    }

    pub fn clear(&self) {
        let mut passages = self.passages.write();
        passages.clear();
        self.index.clear();
        tracing::info!("store cleared");
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Embedding dimensionality, fixed by the first stored passage.
    pub fn dim(&self) -> Option<usize> {
        self.index.dim()
    }

    /// Write all passages to the configured snapshot path.
    pub fn save(&self) -> Result<usize> {
        let path = self
            .snapshot_path
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("store.snapshot_path is not set".into()))?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<usize> {
        let passages = self.passages.read();
        let ordered = self.index.ids();
        snapshot::write(path, ordered.iter().filter_map(|id| passages.get(id)))
    }

    /// Insert every passage from the snapshot at `path`, in file order.
    pub fn load_from(&self, path: &Path) -> Result<usize> {
        let records = snapshot::read(path)?;
        let count = records.len();
        for passage in records {
            self.insert(passage)?;
        }
        tracing::info!(path = %path.display(), passages = count, "snapshot loaded");
        Ok(count)
    }

    /// Flush to the snapshot path, if one is configured, and drop the store.
    pub fn close(self) -> Result<()> {
        if self.snapshot_path.is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn insert(&self, passage: Passage) -> Result<PassageId> {
        let mut passages = self.passages.write();
        if passages.contains_key(&passage.id) {
            return Err(Error::DuplicateId(passage.id));
        }
        self.index.insert(passage.id.clone(), &passage.embedding)?;
        let id = passage.id.clone();
        passages.insert(id.clone(), passage);
        Ok(id)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_with_timeout(self.embedder.as_ref(), text, self.embed_timeout).await
    }
}
