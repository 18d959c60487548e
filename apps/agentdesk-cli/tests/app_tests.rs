use std::fs;
use tempfile::TempDir;

use agentdesk_cli::App;
use agentdesk_core::config::Settings;
use agentdesk_core::traits::VectorIndex;
use agentdesk_core::Error;
use agentdesk_rag::DeskResponse;

fn settings(tmp: &TempDir) -> Settings {
    let mut s = Settings::default();
    s.embedding.use_fake = true;
    s.embedding.dimension = 32;
    s.reranker.enabled = false;
    s.index.uri = tmp.path().join("lancedb").to_string_lossy().to_string();
    s.chunking.chunk_tokens = 20;
    s.chunking.overlap = 4;
    s.llm.providers.clear();
    s
}

#[tokio::test]
async fn ingest_then_retrieve_from_lancedb() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("doc1.md"), "hello world").unwrap();
    fs::write(docs.join("contact.txt"), "Write to help@corp.example or call 555-010-1234 for support").unwrap();
    fs::write(docs.join("ignored.pdf"), "hello world").unwrap();

    let app = App::build(settings(&tmp)).await.expect("app");
    let report = app.ingest_dir(&docs, None, false).await.unwrap();
    assert_eq!(report.documents, 2);
    assert_eq!(app.index.count().await.unwrap(), 2);

    let hits = app.service.retrieve("hello world", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.doc_id, "doc1.md");

    let hits = app.service.retrieve("support", 5).await.unwrap();
    let contact = hits.iter().find(|h| h.payload.doc_id == "contact.txt").expect("contact hit");
    assert!(contact.payload.text.contains("[EMAIL]"));
    assert!(contact.payload.text.contains("[PHONE]"));

    // Re-running ingestion replaces rather than duplicates.
    app.ingest_dir(&docs, None, false).await.unwrap();
    assert_eq!(app.index.count().await.unwrap(), 2);
}

#[tokio::test]
async fn answer_without_providers_is_llm_unavailable() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("doc1.md"), "hello world").unwrap();

    let app = App::build(settings(&tmp)).await.unwrap();
    app.ingest_dir(&docs, None, false).await.unwrap();
    assert!(app.service.reranker().is_degraded());
    assert!(matches!(app.service.answer("hello world", 1).await, Err(Error::LlmUnavailable { .. })));
    assert_eq!(app.service.retrieve("hello world", 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ask_routes_ticket_requests_to_the_ticket_table() {
    let tmp = TempDir::new().unwrap();
    let app = App::build(settings(&tmp)).await.unwrap();
    match app.desk.handle("open a ticket: monitor flickers", 3).await.unwrap() {
        DeskResponse::Tool(v) => assert_eq!(v["status"], "created"),
        other => panic!("expected tool response, got {other:?}"),
    }
}

#[tokio::test]
async fn dimension_change_is_rejected_at_startup() {
    let tmp = TempDir::new().unwrap();
    App::build(settings(&tmp)).await.unwrap();
    let mut wider = settings(&tmp);
    wider.embedding.dimension = 48;
    let err = App::build(wider).await.err().expect("mismatch must fail");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Configuration(_))));
}
