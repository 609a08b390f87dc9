use async_trait::async_trait;

use crate::error::Result;

/// Capability that turns text into a fixed-length vector.
///
/// Implementations report backend failures as `Error::EmbeddingUnavailable`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Stable identifier for the backing model.
    fn name(&self) -> &str;
    /// Compute the embedding of a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Capability that produces text for a prompt. Consumer of blended context.
///
/// Implementations report backend failures as `Error::GenerationUnavailable`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, max_output_length: usize) -> Result<String>;
}
