use std::time::Duration;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;

/// Call `embedder`, bounding the wait by `timeout` when given.
///
/// Any failure, including an elapsed timeout, surfaces as
/// `Error::EmbeddingUnavailable`. No retry is attempted.
pub async fn embed_with_timeout(
    embedder: &dyn Embedder,
    text: &str,
    timeout: Option<Duration>,
) -> Result<Vec<f32>> {
    let call = embedder.embed(text);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::EmbeddingUnavailable(format!("timed out after {limit:?}"))),
        },
        None => call.await,
    };
    result.map_err(|e| {
        tracing::warn!(embedder = embedder.name(), error = %e, "embedding failed");
        match e {
            Error::EmbeddingUnavailable(_) => e,
            other => Error::EmbeddingUnavailable(other.to_string()),
        }
    })
}
