//! Persistent store on a local LanceDB table.
//!
//! Rows are keyed by a blake3 hash of `(source_id, index, text)` and written
//! with merge-insert, so indexing the same chunks twice leaves one copy.
//! Writes are serialized per store; searches run concurrently with them.

use anyhow::{bail, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tokio::sync::Mutex;

use gatekeeper_core::traits::{Embedder, VectorStore};
use gatekeeper_core::types::{Chunk, ScoredChunk};

use crate::schema::{build_chunk_schema, vector_dim};
use crate::table::{distance_column, ensure_table, int32_column, open_db, string_column, table_exists};

pub struct LanceStore {
    db: Connection,
    table_name: String,
    embedder: Arc<dyn Embedder>,
    write_lock: Mutex<()>,
}

pub fn chunk_id(chunk: &Chunk) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(chunk.source_id.as_bytes());
    hasher.update(&(chunk.index as u64).to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

impl LanceStore {
    pub async fn open(uri: &str, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let db = open_db(uri).await?;
        let store = Self { db, table_name: table_name.to_string(), embedder, write_lock: Mutex::new(()) };
        store.check_dim().await?;
        tracing::info!(uri, table = table_name, embedder = store.embedder.embedder_id(), "lancedb store opened");
        Ok(store)
    }

    /// An existing table must have been built with the same vector width.
    async fn check_dim(&self) -> Result<()> {
        if !table_exists(&self.db, &self.table_name).await? {
            return Ok(());
        }
        let schema = self.db.open_table(&self.table_name).execute().await?.schema().await?;
        let expected = self.dim()?;
        match vector_dim(&schema) {
            Some(found) if found == expected => Ok(()),
            Some(found) => bail!(
                "table '{}' stores {}-dimensional vectors but embedder {} produces {}",
                self.table_name,
                found,
                self.embedder.embedder_id(),
                expected
            ),
            None => bail!("table '{}' has no vector column", self.table_name),
        }
    }

    fn dim(&self) -> Result<i32> {
        Ok(i32::try_from(self.embedder.dim())?)
    }

    pub async fn count(&self) -> Result<usize> {
        if !table_exists(&self.db, &self.table_name).await? {
            return Ok(0);
        }
        Ok(self.db.open_table(&self.table_name).execute().await?.count_rows(None).await?)
    }

    fn to_record_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<RecordBatch> {
        let dim = self.dim()?;
        let now = Utc::now().timestamp_millis();
        let ids: Vec<String> = chunks.iter().map(chunk_id).collect();
        let sources: Vec<&str> = chunks.iter().map(|c| c.source_id.as_str()).collect();
        let indices = chunks.iter().map(|c| i32::try_from(c.index)).collect::<Result<Vec<i32>, _>>()?;
        let contents: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
        Ok(RecordBatch::try_new(
            build_chunk_schema(dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(indices)),
                Arc::new(StringArray::from(contents)),
                Arc::new(TimestampMillisecondArray::from(vec![now; chunks.len()])),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
            ],
        )?)
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn index_documents(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            bail!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len());
        }
        let batch = self.to_record_batch(chunks, vectors)?;
        let schema = batch.schema();

        let _guard = self.write_lock.lock().await;
        ensure_table(&self.db, &self.table_name, schema.clone()).await?;
        let table = self.db.open_table(&self.table_name).execute().await?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let mut merge = table.merge_insert(&["id"]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        merge.execute(reader).await?;
        tracing::debug!(table = %self.table_name, rows = chunks.len(), "chunks written");
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || !table_exists(&self.db, &self.table_name).await? {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder.embed_batch(&[query.to_string()]).await?;
        let Some(query_vec) = vectors.pop() else {
            bail!("embedder returned no vector for the query");
        };
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(query_vec)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await?;

        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let sources = string_column(&batch, "source_id")?;
            let indices = int32_column(&batch, "chunk_index")?;
            let contents = string_column(&batch, "content")?;
            let distances = distance_column(&batch);
            for i in 0..batch.num_rows() {
                // Cosine distance is 1 - similarity.
                let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
                hits.push(ScoredChunk {
                    chunk: Chunk {
                        text: contents.value(i).to_string(),
                        source_id: sources.value(i).to_string(),
                        index: usize::try_from(indices.value(i))?,
                    },
                    score,
                });
            }
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}
