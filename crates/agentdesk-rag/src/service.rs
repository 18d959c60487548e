use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use agentdesk_core::tokenize::{estimate_tokens, TokenScheme, WhitespaceScheme};
use agentdesk_core::types::{Answer, Query, RetrievalHit};
use agentdesk_core::Result;

use crate::llm::ProviderChain;
use crate::prompt::compose;
use crate::reranker::Reranker;
use crate::retriever::Retriever;

/// The two exposed operations: `retrieve` and `answer`.
pub struct RagService {
    retriever: Retriever,
    reranker: Reranker,
    chain: ProviderChain,
    scheme: Arc<dyn TokenScheme>,
    max_tokens: usize,
}

impl RagService {
    pub fn new(retriever: Retriever, reranker: Reranker, chain: ProviderChain, max_tokens: usize) -> Self {
        Self { retriever, reranker, chain, scheme: Arc::new(WhitespaceScheme), max_tokens }
    }

    /// Token scheme used for prompt size estimates in logs.
    pub fn with_token_scheme(mut self, scheme: Arc<dyn TokenScheme>) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn reranker(&self) -> &Reranker {
        &self.reranker
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Reranked hits, at most `top_k`. Reranker problems never fail this call.
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        let query = Query::new(query_text, top_k)?;
        async {
            let coarse = self.retriever.retrieve(&query.text, query.top_k).await?;
            let pool = coarse.len();
            let ranked = self.reranker.rerank(&query.text, coarse, query.top_k).await;
            info!(pool, returned = ranked.len(), degraded = self.reranker.is_degraded(), "Retrieved");
            Ok(ranked)
        }
        .instrument(info_span!("retrieve", top_k))
        .await
    }

    pub async fn answer(&self, query_text: &str, top_k: usize) -> Result<Answer> {
        let hits = self.retrieve(query_text, top_k).await?;
        let prompt = compose(query_text, &hits);
        info!(hits = hits.len(), prompt_tokens = estimate_tokens(self.scheme.as_ref(), &prompt), "Prompt composed");
        let generation = self.chain.generate(&prompt, self.max_tokens).await?;
        info!(provider = %generation.provider, "Answer generated");
        Ok(Answer {
            query: query_text.to_string(),
            answer: generation.text,
            sources: hits.iter().map(RetrievalHit::source).collect(),
        })
    }
}
