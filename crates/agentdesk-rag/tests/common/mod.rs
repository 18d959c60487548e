#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentdesk_core::chunker::{Chunker, ChunkingConfig};
use agentdesk_core::traits::{ProvenanceStore, RelevanceScorer, TicketStore, VectorIndex};
use agentdesk_core::types::{Chunk, Document, Payload, RetrievalHit, Ticket};
use agentdesk_core::{Error, Result};
use agentdesk_embed::FakeEmbedder;
use agentdesk_rag::llm::{LlmProvider, ProviderChain, ProviderError};
use agentdesk_rag::{Ingestor, RagService, Reranker, Retriever};
use agentdesk_vector::InMemoryVectorIndex;

pub const DIM: usize = 64;

pub fn hit(doc: &str, chunk_id: u32, text: &str, score: f32) -> RetrievalHit {
    let payload = Payload {
        doc_id: doc.to_string(),
        chunk_id,
        text: text.to_string(),
        char_start: 0,
        char_end: text.len(),
        token_count: text.split_whitespace().count() as u32,
    };
    RetrievalHit::new(format!("{doc}-{chunk_id}"), payload, score)
}

/// Scores each candidate by a lookup on its text.
pub struct TableScorer(pub Vec<(String, f32)>);

impl RelevanceScorer for TableScorer {
    fn score_pairs(&self, _query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        Ok(candidates
            .iter()
            .map(|c| self.0.iter().find(|(t, _)| t == c).map_or(0.0, |(_, s)| *s))
            .collect())
    }
}

pub struct FailingScorer;

impl RelevanceScorer for FailingScorer {
    fn score_pairs(&self, _query: &str, _candidates: &[String]) -> Result<Vec<f32>> {
        Err(Error::RerankDegraded("model crashed".to_string()))
    }
}

pub struct StaticProvider {
    pub name: &'static str,
    pub reply: String,
}

#[async_trait]
impl LlmProvider for StaticProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, _prompt: &str, _max_tokens: usize) -> std::result::Result<String, ProviderError> {
        Ok(self.reply.clone())
    }
}

pub struct DownProvider(pub &'static str);

#[async_trait]
impl LlmProvider for DownProvider {
    fn name(&self) -> &str {
        self.0
    }

    async fn send(&self, _prompt: &str, _max_tokens: usize) -> std::result::Result<String, ProviderError> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }
}

pub struct SlowProvider;

#[async_trait]
impl LlmProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn send(&self, _prompt: &str, _max_tokens: usize) -> std::result::Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("too late".to_string())
    }
}

pub fn chain(providers: Vec<Box<dyn LlmProvider>>) -> ProviderChain {
    ProviderChain::new(providers, Duration::from_millis(200))
}

pub fn down_chain() -> ProviderChain {
    chain(vec![Box::new(DownProvider("local-t5")), Box::new(DownProvider("openai")), Box::new(DownProvider("gemini"))])
}

pub fn whitespace_chunker(chunk_tokens: usize, overlap: usize) -> Chunker {
    Chunker::whitespace(ChunkingConfig::new(chunk_tokens, overlap).expect("valid sizing")).expect("chunker")
}

pub struct Fixture {
    pub index: Arc<InMemoryVectorIndex>,
    pub embedder: Arc<FakeEmbedder>,
}

impl Fixture {
    pub fn new() -> Self {
        Self { index: Arc::new(InMemoryVectorIndex::new()), embedder: Arc::new(FakeEmbedder::new(DIM)) }
    }

    pub fn ingestor(&self, chunk_tokens: usize, overlap: usize) -> Ingestor {
        Ingestor::new(whitespace_chunker(chunk_tokens, overlap), self.embedder.clone(), self.index.clone())
    }

    pub async fn ingest(&self, docs: &[(&str, &str)]) {
        let documents: Vec<Document> = docs.iter().map(|(id, text)| Document::new(*id, *text, true)).collect();
        self.ingestor(50, 5).ingest_documents(&documents).await.expect("ingest");
    }

    pub fn retriever(&self, coarse_limit: usize) -> Retriever {
        Retriever::new(self.embedder.clone(), self.index.clone(), coarse_limit)
    }

    pub fn service(&self, reranker: Reranker, chain: ProviderChain) -> RagService {
        RagService::new(self.retriever(50), reranker, chain, 64)
    }

    pub async fn count(&self) -> usize {
        self.index.count().await.expect("count")
    }
}

#[derive(Default)]
pub struct RecordingProvenance {
    pub documents: Mutex<Vec<String>>,
    pub chunks: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ProvenanceStore for RecordingProvenance {
    async fn record_document(&self, document: &Document) -> Result<()> {
        self.documents.lock().unwrap().push(document.doc_id.clone());
        Ok(())
    }

    async fn record_chunks(&self, doc_id: &str, chunks: &[Chunk]) -> Result<()> {
        self.chunks.lock().unwrap().push((doc_id.to_string(), chunks.len()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTickets {
    pub tickets: Mutex<Vec<Ticket>>,
}

#[async_trait]
impl TicketStore for MemoryTickets {
    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(())
    }
}

pub struct BrokenTickets;

#[async_trait]
impl TicketStore for BrokenTickets {
    async fn create_ticket(&self, _ticket: &Ticket) -> Result<()> {
        Err(Error::IndexUnavailable("tickets table offline".to_string()))
    }
}
