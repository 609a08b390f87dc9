//! Ranking of caller-supplied texts against a query without storing them.

use std::time::Duration;

use futures::future::try_join_all;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use localrag_vector::cosine_similarity;

use crate::embed::embed_with_timeout;

/// `(index into docs, score)` pairs by descending similarity; equal scores
/// keep the order of `docs`.
///
/// Every embedding call is bounded by `timeout` when given. A document
/// embedding whose length differs from the query's fails with
/// `Error::DimensionMismatch`.
pub async fn rank_documents<S>(
    embedder: &dyn Embedder,
    query: &str,
    docs: &[S],
    timeout: Option<Duration>,
) -> Result<Vec<(usize, f32)>>
where
    S: AsRef<str> + Sync,
{
    if docs.is_empty() {
        return Ok(Vec::new());
    }
    let q = embed_with_timeout(embedder, query, timeout).await?;
    let embedded = try_join_all(
        docs.iter().map(|d| embed_with_timeout(embedder, d.as_ref(), timeout)),
    )
    .await?;

    let mut scored = Vec::with_capacity(embedded.len());
    for (i, e) in embedded.iter().enumerate() {
        if e.len() != q.len() {
            return Err(Error::DimensionMismatch { expected: q.len(), actual: e.len() });
        }
        scored.push((i, cosine_similarity(&q, e)));
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(scored)
}

/// The text in `docs` most similar to `query`.
pub async fn best_document<'a, S>(
    embedder: &dyn Embedder,
    query: &str,
    docs: &'a [S],
    timeout: Option<Duration>,
) -> Result<Option<&'a str>>
where
    S: AsRef<str> + Sync,
{
    let ranked = rank_documents(embedder, query, docs, timeout).await?;
    Ok(ranked.first().map(|&(i, _)| docs[i].as_ref()))
}
