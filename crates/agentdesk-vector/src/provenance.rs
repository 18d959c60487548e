//! Write-only provenance and ticket tables stored beside the vectors.

use arrow_array::{RecordBatch, StringArray, TimestampMillisecondArray, UInt32Array, UInt64Array};
use async_trait::async_trait;
use chrono::Utc;
use lancedb::Connection;
use std::sync::Arc;
use tracing::debug;

use agentdesk_core::traits::{ProvenanceStore, TicketStore};
use agentdesk_core::types::{Chunk, Document, Ticket};
use agentdesk_core::Result;

use crate::schema::{build_chunks_schema, build_documents_schema, build_tickets_schema};
use crate::table::{ensure_table, index_err, open_table, reader, sql_literal};

pub const DOCUMENTS_TABLE: &str = "documents";
pub const CHUNKS_TABLE: &str = "chunks";
pub const TICKETS_TABLE: &str = "tickets";

pub struct LanceProvenanceStore {
    conn: Connection,
}

impl LanceProvenanceStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ProvenanceStore for LanceProvenanceStore {
    async fn record_document(&self, document: &Document) -> Result<()> {
        ensure_table(&self.conn, DOCUMENTS_TABLE, build_documents_schema()).await?;
        let batch = RecordBatch::try_new(
            build_documents_schema(),
            vec![
                Arc::new(StringArray::from(vec![document.doc_id.clone()])),
                Arc::new(StringArray::from(vec![document.redacted_text.clone()])),
                Arc::new(StringArray::from(vec![document.content_hash()])),
                Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
            ],
        )
        .map_err(index_err)?;
        let table = open_table(&self.conn, DOCUMENTS_TABLE).await?;
        // doc_id is unique
        let mut mi = table.merge_insert(&["doc_id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader(batch)).await.map_err(index_err)?;
        Ok(())
    }

    async fn record_chunks(&self, doc_id: &str, chunks: &[Chunk]) -> Result<()> {
        ensure_table(&self.conn, CHUNKS_TABLE, build_chunks_schema()).await?;
        let table = open_table(&self.conn, CHUNKS_TABLE).await?;
        table
            .delete(&format!("doc_id = {}", sql_literal(doc_id)))
            .await
            .map_err(index_err)?;
        if chunks.is_empty() {
            return Ok(());
        }
        let batch = RecordBatch::try_new(
            build_chunks_schema(),
            vec![
                Arc::new(StringArray::from(chunks.iter().map(|c| c.doc_id.clone()).collect::<Vec<_>>())),
                Arc::new(UInt32Array::from(chunks.iter().map(|c| c.chunk_id).collect::<Vec<_>>())),
                Arc::new(StringArray::from(chunks.iter().map(|c| c.text.clone()).collect::<Vec<_>>())),
                Arc::new(UInt32Array::from(chunks.iter().map(|c| c.token_count).collect::<Vec<_>>())),
                Arc::new(UInt64Array::from(chunks.iter().map(|c| c.char_start as u64).collect::<Vec<_>>())),
                Arc::new(UInt64Array::from(chunks.iter().map(|c| c.char_end as u64).collect::<Vec<_>>())),
            ],
        )
        .map_err(index_err)?;
        table.add(reader(batch)).execute().await.map_err(index_err)?;
        debug!(doc_id, chunks = chunks.len(), "Recorded chunk provenance");
        Ok(())
    }
}

pub struct LanceTicketStore {
    conn: Connection,
}

impl LanceTicketStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TicketStore for LanceTicketStore {
    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        ensure_table(&self.conn, TICKETS_TABLE, build_tickets_schema()).await?;
        let batch = RecordBatch::try_new(
            build_tickets_schema(),
            vec![
                Arc::new(StringArray::from(vec![ticket.ticket_id.clone()])),
                Arc::new(StringArray::from(vec![ticket.title.clone()])),
                Arc::new(StringArray::from(vec![ticket.description.clone()])),
                Arc::new(StringArray::from(vec![ticket.priority.clone()])),
                Arc::new(StringArray::from(vec![ticket.status.clone()])),
                Arc::new(TimestampMillisecondArray::from(vec![ticket.created_at.timestamp_millis()])),
            ],
        )
        .map_err(index_err)?;
        open_table(&self.conn, TICKETS_TABLE)
            .await?
            .add(reader(batch))
            .execute()
            .await
            .map_err(index_err)?;
        debug!(ticket_id = %ticket.ticket_id, "Stored ticket");
        Ok(())
    }
}
