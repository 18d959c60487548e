//! Ingestion pipeline: document → chunks → embeddings → index.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use agentdesk_core::chunker::Chunker;
use agentdesk_core::traits::{Embedder, ProvenanceStore, VectorIndex};
use agentdesk_core::types::{DistanceMetric, Document, IndexedPoint};
use agentdesk_core::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub points: usize,
    pub flushes: usize,
    pub empty_documents: usize,
}

/// Writes documents into a vector index, replacing any earlier version of the
/// same `doc_id`. Points are upserted every `batch_size` points.
pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    provenance: Option<Arc<dyn ProvenanceStore>>,
    batch_size: usize,
    context_prefix: bool,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            chunker,
            embedder,
            index,
            provenance: None,
            batch_size: 100,
            context_prefix: true,
            show_progress: false,
        }
    }

    pub fn with_provenance(mut self, store: Arc<dyn ProvenanceStore>) -> Self {
        self.provenance = Some(store);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_context_prefix(mut self, enabled: bool) -> Self {
        self.context_prefix = enabled;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    async fn flush(&self, pending: &mut Vec<IndexedPoint>, report: &mut IngestReport) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let written = self.index.upsert(pending).await?;
        report.points += written;
        report.flushes += 1;
        debug!(points = written, "Flushed batch");
        pending.clear();
        Ok(())
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        let expected = texts.len();
        let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("embedding task failed: {e}")))??;
        if vectors.len() != expected {
            return Err(Error::EmbeddingUnavailable(format!("expected {expected} vectors, got {}", vectors.len())));
        }
        Ok(vectors)
    }

    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        self.index.ensure_collection(self.embedder.dim(), DistanceMetric::Cosine).await?;
        let chunk_tokens = self.chunker.config().chunk_tokens;
        if chunk_tokens > self.embedder.max_len() {
            warn!(
                chunk_tokens,
                max_len = self.embedder.max_len(),
                "Chunk size exceeds the embedder input length; long chunks are truncated when embedded"
            );
        }
        let mut report = IngestReport::default();
        let mut pending: Vec<IndexedPoint> = Vec::with_capacity(self.batch_size);
        let pb = self.progress_bar(documents.len());

        for document in documents {
            pb.set_message(document.doc_id.clone());
            // A buffered earlier copy of this document must land before it is deleted.
            if pending.iter().any(|p| p.payload.doc_id == document.doc_id) {
                self.flush(&mut pending, &mut report).await?;
            }
            self.index.delete_document(&document.doc_id).await?;

            let chunks = self.chunker.chunk_document(document)?;
            if let Some(store) = &self.provenance {
                store.record_document(document).await?;
                store.record_chunks(&document.doc_id, &chunks).await?;
            }
            report.documents += 1;
            report.chunks += chunks.len();
            if chunks.is_empty() {
                report.empty_documents += 1;
                pb.inc(1);
                continue;
            }

            for group in chunks.chunks(self.batch_size) {
                let texts = group.iter().map(|c| c.embedding_text(self.context_prefix)).collect();
                let vectors = self.embed(texts).await?;
                for (chunk, vector) in group.iter().zip(vectors) {
                    pending.push(IndexedPoint::from_chunk(chunk, vector));
                    if pending.len() >= self.batch_size {
                        self.flush(&mut pending, &mut report).await?;
                    }
                }
            }
            debug!(doc_id = %document.doc_id, chunks = chunks.len(), "Ingested document");
            pb.inc(1);
        }
        self.flush(&mut pending, &mut report).await?;
        pb.finish_with_message("done");
        info!(
            documents = report.documents,
            chunks = report.chunks,
            points = report.points,
            flushes = report.flushes,
            "Ingestion complete"
        );
        Ok(report)
    }
}
