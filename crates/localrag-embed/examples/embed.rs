use localrag_core::config::EmbeddingConfig;
use localrag_embed::get_default_embedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbeddingConfig::default())?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts).await?;
    println!("B={} dim={} model={}", embs.len(), embedder.dim(), embedder.name());
    Ok(())
}
