mod common;

use std::sync::Arc;

use agentdesk_core::Error;
use agentdesk_embed::FakeScorer;
use agentdesk_rag::Reranker;
use common::{chain, down_chain, Fixture, StaticProvider};

#[tokio::test]
async fn hello_world_single_hit() {
    let fx = Fixture::new();
    fx.ingest(&[("doc1.md", "hello world")]).await;
    let service = fx.service(Reranker::new(Arc::new(FakeScorer)), down_chain());

    let hits = service.retrieve("hello world", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.doc_id, "doc1.md");
    assert_eq!(hits[0].payload.chunk_id, 0);
    assert_eq!(hits[0].payload.text, "hello world");
}

#[tokio::test]
async fn all_providers_down_fails_answer_but_not_retrieve() {
    let fx = Fixture::new();
    fx.ingest(&[("doc1.md", "hello world")]).await;
    let service = fx.service(Reranker::degraded("test"), down_chain());

    assert_eq!(service.retrieve("hello world", 1).await.unwrap().len(), 1);
    match service.answer("hello world", 1).await {
        Err(Error::LlmUnavailable { attempts }) => assert_eq!(attempts.len(), 3),
        other => panic!("expected LlmUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn answer_cites_reranked_sources() {
    let fx = Fixture::new();
    fx.ingest(&[
        ("billing.md", "Refunds are issued within five business days of approval."),
        ("vpn.md", "Connect to the VPN with the corporate client before opening the wiki."),
        ("printer.md", "The third floor printer needs a badge to release jobs."),
    ])
    .await;
    let reply = StaticProvider { name: "stub", reply: "Within five days [S-0].".into() };
    let service = fx.service(Reranker::new(Arc::new(FakeScorer)), chain(vec![Box::new(reply)]));

    let answer = service.answer("How long do refunds take?", 2).await.unwrap();
    assert_eq!(answer.query, "How long do refunds take?");
    assert_eq!(answer.answer, "Within five days [S-0].");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].doc_id, "billing.md");
}

#[tokio::test]
async fn zero_top_k_is_invalid() {
    let fx = Fixture::new();
    fx.ingest(&[("doc1.md", "hello world")]).await;
    let service = fx.service(Reranker::degraded("test"), down_chain());
    assert!(matches!(service.retrieve("hello", 0).await, Err(Error::InvalidQuery(_))));
    assert!(matches!(service.answer("hello", 0).await, Err(Error::InvalidQuery(_))));
}

#[tokio::test]
async fn retrieval_never_exceeds_top_k_and_pool_covers_it() {
    let fx = Fixture::new();
    let docs: Vec<(String, String)> =
        (0..12).map(|i| (format!("doc{i}.md"), format!("topic {i} shared words about networking"))).collect();
    let borrowed: Vec<(&str, &str)> = docs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    fx.ingest(&borrowed).await;

    let retriever = fx.retriever(3);
    let service = agentdesk_rag::RagService::new(retriever.clone(), Reranker::new(Arc::new(FakeScorer)), down_chain(), 16);
    for k in 1..=15 {
        assert!(retriever.coarse_limit_for(k) >= k);
        let coarse = retriever.retrieve("networking words", k).await.unwrap();
        assert!(coarse.len() <= retriever.coarse_limit_for(k));
        assert_eq!(coarse.len(), k.max(3).min(12));
        let hits = service.retrieve("networking words", k).await.unwrap();
        assert_eq!(hits.len(), k.min(12));
    }
}

#[tokio::test]
async fn empty_index_returns_no_hits() {
    let fx = Fixture::new();
    fx.ingest(&[]).await;
    let service = fx.service(Reranker::degraded("test"), down_chain());
    assert!(service.retrieve("anything", 3).await.unwrap().is_empty());
}
