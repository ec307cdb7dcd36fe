use gatekeeper_core::config::Config;
use gatekeeper_embed::build_embedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = build_embedder(&settings.embedding)?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts).await?;
    println!("{} B={} dim={}", embedder.embedder_id(), embs.len(), embedder.dim());
    Ok(())
}
