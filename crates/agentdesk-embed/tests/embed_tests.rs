use agentdesk_core::config::{EmbeddingSettings, RerankerSettings};
use agentdesk_core::traits::{Embedder, RelevanceScorer};
use agentdesk_core::Error;
use agentdesk_embed::weights::resolve_model_dir;
use agentdesk_embed::{get_default_embedder, load_scorer, FakeEmbedder, FakeScorer};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, dimension: 64, ..Default::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string(), "other".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");

    assert_eq!(embs.len(), 3, "one vector per input");
    assert_eq!(embedder.dim(), 64);
    assert!(embs.iter().all(|v| v.len() == 64));
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    assert_eq!(embs[0], embs[1]);
}

#[test]
fn fake_embedder_places_shared_terms_closer() {
    let e = FakeEmbedder::new(256);
    let q = e.embed("reset my password").unwrap();
    let near = e.embed("How to reset your password").unwrap();
    let far = e.embed("Quarterly revenue grew").unwrap();
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn fake_embedder_gives_termless_text_a_unit_vector() {
    let e = FakeEmbedder::new(32);
    for text in ["???", "", "  -- !! "] {
        let v = e.embed(text).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-6, "{text:?} has norm {norm}");
    }
    let q = e.embed("???").unwrap();
    let doc = e.embed("reset my password").unwrap();
    assert!(cosine(&q, &doc).is_finite());
    assert_eq!(e.embed("???").unwrap(), e.embed("").unwrap());
}

#[test]
fn fake_scorer_counts_term_overlap() {
    let scores = FakeScorer
        .score_pairs("billing refund", &["Refund policy for billing".into(), "refund only".into(), "nothing".into()])
        .unwrap();
    assert_eq!(scores, vec![1.0, 0.5, 0.0]);
}

#[test]
fn missing_model_dir_is_embedding_unavailable() {
    let settings = EmbeddingSettings { model_dir: Some("/definitely/not/here".into()), ..Default::default() };
    std::env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    assert!(matches!(get_default_embedder(&settings), Err(Error::EmbeddingUnavailable(_))));
}

#[test]
fn disabled_reranker_reports_degraded() {
    let settings = RerankerSettings { enabled: false, ..Default::default() };
    assert!(matches!(load_scorer(&settings), Err(Error::RerankDegraded(_))));
}

#[test]
fn resolve_model_dir_prefers_configured_path() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_string_lossy().to_string();
    assert_eq!(resolve_model_dir(Some(&dir), "org/model").unwrap(), tmp.path());
    assert!(resolve_model_dir(None, "org/surely-missing-model").is_err());
}
