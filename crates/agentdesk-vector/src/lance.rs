use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, StringArray, UInt32Array, UInt64Array};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use agentdesk_core::traits::VectorIndex;
use agentdesk_core::types::{DistanceMetric, IndexedPoint, Payload, RetrievalHit};
use agentdesk_core::{Error, Result};

use crate::schema::{build_points_schema, vector_dimension};
use crate::table::{column, ensure_table, index_err, open_db, open_table, reader, sql_literal, table_exists};

/// Vector index over one LanceDB table.
pub struct LanceVectorIndex {
    conn: Connection,
    table_name: String,
    dimension: OnceLock<usize>,
}

impl LanceVectorIndex {
    pub async fn open(uri: &str, collection: &str) -> Result<Self> {
        Ok(Self::from_connection(open_db(uri).await?, collection))
    }

    pub fn from_connection(conn: Connection, collection: &str) -> Self {
        Self { conn, table_name: collection.to_string(), dimension: OnceLock::new() }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn dimension(&self) -> Result<usize> {
        if let Some(d) = self.dimension.get() {
            return Ok(*d);
        }
        let existing = self
            .existing_dimension()
            .await?
            .ok_or_else(|| Error::IndexUnavailable(format!("collection '{}' has not been created", self.table_name)))?;
        Ok(*self.dimension.get_or_init(|| existing))
    }

    async fn existing_dimension(&self) -> Result<Option<usize>> {
        if !table_exists(&self.conn, &self.table_name).await? {
            return Ok(None);
        }
        let table = open_table(&self.conn, &self.table_name).await?;
        let schema = table.schema().await.map_err(index_err)?;
        vector_dimension(&schema)
            .map(Some)
            .ok_or_else(|| Error::Configuration(format!("table '{}' has no fixed-size vector column", self.table_name)))
    }

    fn check_len(&self, len: usize, dim: usize) -> Result<()> {
        if len != dim {
            return Err(Error::Configuration(format!(
                "vector length {} does not match collection '{}' dimension {}",
                len, self.table_name, dim
            )));
        }
        Ok(())
    }

    fn points_to_record_batch(points: &[IndexedPoint], dim: usize) -> Result<RecordBatch> {
        let mut ids = Vec::with_capacity(points.len());
        let mut doc_ids = Vec::with_capacity(points.len());
        let mut chunk_ids = Vec::with_capacity(points.len());
        let mut texts = Vec::with_capacity(points.len());
        let mut starts = Vec::with_capacity(points.len());
        let mut ends = Vec::with_capacity(points.len());
        let mut token_counts = Vec::with_capacity(points.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(points.len());
        for p in points {
            ids.push(p.id.clone());
            doc_ids.push(p.payload.doc_id.clone());
            chunk_ids.push(p.payload.chunk_id);
            texts.push(p.payload.text.clone());
            starts.push(p.payload.char_start as u64);
            ends.push(p.payload.char_end as u64);
            token_counts.push(p.payload.token_count);
            vectors.push(Some(p.vector.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            build_points_schema(dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(doc_ids)),
                Arc::new(UInt32Array::from(chunk_ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(UInt64Array::from(starts)),
                Arc::new(UInt64Array::from(ends)),
                Arc::new(UInt32Array::from(token_counts)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim as i32)),
            ],
        )
        .map_err(index_err)
    }

    fn hits_from_batch(batch: &RecordBatch, hits: &mut Vec<RetrievalHit>) -> Result<()> {
        let ids = column::<StringArray>(batch, "id")?;
        let doc_ids = column::<StringArray>(batch, "doc_id")?;
        let chunk_ids = column::<UInt32Array>(batch, "chunk_id")?;
        let texts = column::<StringArray>(batch, "text")?;
        let starts = column::<UInt64Array>(batch, "char_start")?;
        let ends = column::<UInt64Array>(batch, "char_end")?;
        let token_counts = column::<UInt32Array>(batch, "token_count")?;
        let distances = column::<Float32Array>(batch, "_distance")?;
        for i in 0..batch.num_rows() {
            let payload = Payload {
                doc_id: doc_ids.value(i).to_string(),
                chunk_id: chunk_ids.value(i),
                text: texts.value(i).to_string(),
                char_start: starts.value(i) as usize,
                char_end: ends.value(i) as usize,
                token_count: token_counts.value(i),
            };
            // Cosine distance is 1 - similarity.
            hits.push(RetrievalHit::new(ids.value(i), payload, 1.0 - distances.value(i)));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn ensure_collection(&self, dimension: usize, metric: DistanceMetric) -> Result<()> {
        match self.existing_dimension().await? {
            Some(existing) if existing != dimension => Err(Error::Configuration(format!(
                "collection '{}' has dimension {}, embedder produces {}",
                self.table_name, existing, dimension
            ))),
            Some(_) => {
                let _ = self.dimension.set(dimension);
                Ok(())
            }
            None => {
                ensure_table(&self.conn, &self.table_name, build_points_schema(dimension)).await?;
                let _ = self.dimension.set(dimension);
                info!(collection = %self.table_name, dimension, ?metric, "Created collection");
                Ok(())
            }
        }
    }

    async fn upsert(&self, points: &[IndexedPoint]) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }
        let dim = self.dimension().await?;
        for p in points {
            self.check_len(p.vector.len(), dim)?;
        }
        let batch = Self::points_to_record_batch(points, dim)?;
        let table = open_table(&self.conn, &self.table_name).await?;
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader(batch)).await.map_err(index_err)?;
        debug!(collection = %self.table_name, points = points.len(), "Upserted points");
        Ok(points.len())
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievalHit>> {
        let dim = self.dimension().await?;
        self.check_len(query_vector.len(), dim)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let table = open_table(&self.conn, &self.table_name).await?;
        if table.count_rows(None).await.map_err(index_err)? == 0 {
            return Ok(Vec::new());
        }
        let mut stream = table
            .vector_search(query_vector.to_vec())
            .map_err(index_err)?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(index_err)?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(index_err)? {
            Self::hits_from_batch(&batch, &mut hits)?;
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        if !table_exists(&self.conn, &self.table_name).await? {
            return Ok(());
        }
        let table = open_table(&self.conn, &self.table_name).await?;
        table
            .delete(&format!("doc_id = {}", sql_literal(doc_id)))
            .await
            .map_err(index_err)?;
        debug!(collection = %self.table_name, doc_id, "Deleted document points");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        if !table_exists(&self.conn, &self.table_name).await? {
            return Ok(0);
        }
        let table = open_table(&self.conn, &self.table_name).await?;
        table.count_rows(None).await.map_err(index_err)
    }
}
