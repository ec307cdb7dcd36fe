//! Vector stores behind the [`VectorStore`] trait: [`LanceStore`] persists to
//! a local LanceDB directory, [`MemoryStore`] keeps everything in memory.

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

use anyhow::Result;
use std::sync::Arc;

use gatekeeper_core::config::{expand_path, StoreBackend, StoreSettings};
use gatekeeper_core::traits::{Embedder, VectorStore};

pub use lance::LanceStore;
pub use memory::MemoryStore;

pub async fn build_store(settings: &StoreSettings, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn VectorStore>> {
    match settings.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(embedder))),
        StoreBackend::LanceDb => {
            let dir = expand_path(&settings.uri);
            std::fs::create_dir_all(&dir)?;
            let store = LanceStore::open(&dir.to_string_lossy(), &settings.table, embedder).await?;
            Ok(Arc::new(store))
        }
    }
}
