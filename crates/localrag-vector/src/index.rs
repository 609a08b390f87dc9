use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::RwLock;

use localrag_core::error::{Error, Result};
use localrag_core::types::{PassageId, SearchHit};

use crate::metric::{dot, normalized};

/// Exact nearest-neighbour index over L2-normalized embeddings.
///
/// Readers share the lock; `insert`/`remove`/`clear` take it exclusively, so
/// an entry is either fully visible to `search` or absent. Entries keep their
/// insertion order, which breaks score ties.
#[derive(Debug, Default)]
pub struct VectorIndex {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    dim: Option<usize>,
    entries: Vec<Entry>,
    positions: HashMap<PassageId, usize>,
}

#[derive(Debug)]
struct Entry {
    id: PassageId,
    vector: Vec<f32>,
}

fn check_finite(v: &[f32]) -> Result<()> {
    if v.is_empty() {
        return Err(Error::InvalidEmbedding("embedding is empty".into()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding("embedding contains NaN or infinite values".into()));
    }
    Ok(())
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `embedding` under `id`. The first insert fixes the dimensionality.
    pub fn insert(&self, id: impl Into<PassageId>, embedding: &[f32]) -> Result<()> {
        let id = id.into();
        check_finite(embedding)?;
        let vector = normalized(embedding);

        let mut inner = self.inner.write();
        if let Some(expected) = inner.dim {
            if expected != vector.len() {
                return Err(Error::DimensionMismatch { expected, actual: vector.len() });
            }
        }
        if inner.positions.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        let pos = inner.entries.len();
        inner.dim = Some(vector.len());
        inner.positions.insert(id.clone(), pos);
        inner.entries.push(Entry { id, vector });
        Ok(())
    }

    /// Up to `k` entries by descending cosine similarity to `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let inner = self.inner.read();
        if k == 0 || inner.entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = inner.dim {
            if expected != query.len() {
                return Err(Error::DimensionMismatch { expected, actual: query.len() });
            }
        }
        check_finite(query)?;
        let query = normalized(query);

        let mut scored: Vec<(usize, f32)> = inner
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (pos, dot(&query, &e.vector)))
            .collect();
        let rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        tracing::debug!(entries = inner.entries.len(), k, hits = scored.len(), "vector search");
        Ok(scored
            .into_iter()
            .map(|(pos, score)| SearchHit { id: inner.entries[pos].id.clone(), score })
            .collect())
    }

    /// Remove `id` if present. Returns whether an entry was dropped.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(pos) = inner.positions.remove(id) else {
            return false;
        };
        inner.entries.remove(pos);
        let Inner { entries, positions, .. } = &mut *inner;
        for (offset, entry) in entries[pos..].iter().enumerate() {
            positions.insert(entry.id.clone(), pos + offset);
        }
        true
    }

    /// Drop every entry and forget the dimensionality.
    pub fn clear(&self) {
        *self.inner.write() = Inner::default();
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn dim(&self) -> Option<usize> {
        self.inner.read().dim
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().positions.contains_key(id)
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<PassageId> {
        self.inner.read().entries.iter().map(|e| e.id.clone()).collect()
    }
}
