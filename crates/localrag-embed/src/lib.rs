//! Embedding collaborators and the startup-time choice between them.
//!
//! Model-backed embedders live outside this workspace and plug in through
//! [`localrag_core::traits::Embedder`]; this crate ships the deterministic
//! [`HashEmbedder`] used for tests and offline runs.

use std::sync::Arc;

use localrag_core::config::EmbeddingConfig;
use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;

pub mod hash;

pub use hash::HashEmbedder;

/// Build the embedder named by `config.backend`. Called once at startup; the
/// result is injected into the document store.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend.as_str() {
        "hash" | "fake" => {
            let embedder = HashEmbedder::new(config.dim)?;
            tracing::info!(name = embedder.name(), "using hashing embedder");
            Ok(Arc::new(embedder))
        }
        other => Err(Error::InvalidConfig(format!("unknown embedding backend '{other}'"))),
    }
}
