//! Wiring from [`Settings`] to the running services.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use agentdesk_core::chunker::Chunker;
use agentdesk_core::config::{expand_path, Settings};
use agentdesk_core::data_processor::DataProcessor;
use agentdesk_core::tokenize::load_scheme;
use agentdesk_core::traits::{Embedder, VectorIndex};
use agentdesk_core::types::DistanceMetric;
use agentdesk_embed::{get_default_embedder, load_scorer};
use agentdesk_rag::llm::build_chain;
use agentdesk_rag::{Desk, IngestReport, Ingestor, KeywordClassifier, RagService, Reranker, Retriever, TicketTool};
use agentdesk_vector::{LanceProvenanceStore, LanceTicketStore, LanceVectorIndex};

pub struct App {
    pub settings: Settings,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<LanceVectorIndex>,
    pub chunker: Chunker,
    pub service: Arc<RagService>,
    pub desk: Desk,
}

impl App {
    /// Load models once, open the index and make sure its dimension matches
    /// the embedder.
    pub async fn build(settings: Settings) -> Result<Self> {
        let embedder = get_default_embedder(&settings.embedding).context("loading embedder")?;
        let uri = expand_path(&settings.index.uri);
        let index = Arc::new(LanceVectorIndex::open(&uri.to_string_lossy(), &settings.index.collection).await?);
        index.ensure_collection(embedder.dim(), DistanceMetric::Cosine).await?;

        let scheme = load_scheme(settings.chunking.tokenizer_path.as_deref().map(expand_path).as_deref());
        let chunker = Chunker::new(scheme.clone(), settings.chunking.config())?;

        let retriever = Retriever::new(embedder.clone(), index.clone(), settings.retrieval.coarse_limit);
        let reranker = Reranker::from_loaded(load_scorer(&settings.reranker));
        let chain = build_chain(&settings.llm);
        let service = Arc::new(
            RagService::new(retriever, reranker, chain, settings.llm.max_tokens).with_token_scheme(scheme),
        );

        let tickets = Arc::new(LanceTicketStore::new(index.connection().clone()));
        let desk = Desk::new(
            Box::new(KeywordClassifier::new(settings.router.tool_keywords.clone())),
            Arc::new(TicketTool::new(tickets).with_priority(settings.router.ticket_priority.clone())),
            service.clone(),
        );
        info!(uri = %uri.display(), collection = %settings.index.collection, "AgentDesk ready");
        Ok(Self { settings, embedder, index, chunker, service, desk })
    }

    pub async fn ingest_dir(&self, dir: &Path, limit: Option<usize>, progress: bool) -> Result<IngestReport> {
        let processor = DataProcessor::new(self.settings.ingest.extensions.clone(), self.settings.chunking.redact_pii);
        let documents = match limit {
            Some(n) => processor.load_directory_limited(dir, n)?,
            None => processor.load_directory(dir)?,
        };
        let mut ingestor = Ingestor::new(self.chunker.clone(), self.embedder.clone(), self.index.clone())
            .with_batch_size(self.settings.ingest.batch_size)
            .with_context_prefix(self.settings.chunking.context_prefix)
            .with_progress(progress);
        if self.settings.index.provenance {
            ingestor = ingestor.with_provenance(Arc::new(LanceProvenanceStore::new(self.index.connection().clone())));
        }
        Ok(ingestor.ingest_documents(&documents).await?)
    }

    pub fn default_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.settings.retrieval.default_top_k)
    }
}
