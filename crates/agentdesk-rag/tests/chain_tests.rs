mod common;

use std::time::Duration;

use agentdesk_core::config::LlmSettings;
use agentdesk_core::config::ProviderSettings;
use agentdesk_core::Error;
use agentdesk_rag::llm::gemini::parse_generate_content;
use agentdesk_rag::llm::openai::parse_chat_completion;
use agentdesk_rag::llm::{build_chain, GeminiProvider, LlmProvider, OpenAiProvider, ProviderError};
use common::{chain, DownProvider, SlowProvider, StaticProvider};

#[tokio::test]
async fn first_success_wins() {
    let c = chain(vec![
        Box::new(StaticProvider { name: "a", reply: " first ".into() }),
        Box::new(StaticProvider { name: "b", reply: "second".into() }),
    ]);
    let g = c.generate("p", 10).await.unwrap();
    assert_eq!(g.text, "first");
    assert_eq!(g.provider, "a");
}

#[tokio::test]
async fn failures_fall_through_in_order() {
    let c = chain(vec![
        Box::new(DownProvider("local-t5")),
        Box::new(StaticProvider { name: "empty", reply: "   ".into() }),
        Box::new(StaticProvider { name: "gemini", reply: "ok".into() }),
    ]);
    let g = c.generate("p", 10).await.unwrap();
    assert_eq!(g.provider, "gemini");
}

#[tokio::test]
async fn timeout_counts_as_failure() {
    let c = chain(vec![Box::new(SlowProvider), Box::new(StaticProvider { name: "backup", reply: "ok".into() })]);
    let started = std::time::Instant::now();
    let g = c.generate("p", 10).await.unwrap();
    assert_eq!(g.provider, "backup");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn exhausted_chain_is_llm_unavailable() {
    let c = chain(vec![Box::new(DownProvider("x")), Box::new(SlowProvider)]);
    match c.generate("p", 10).await {
        Err(Error::LlmUnavailable { attempts }) => {
            assert_eq!(attempts.len(), 2);
            assert!(attempts[0].starts_with("x:"));
            assert!(attempts[1].contains("timed out"));
        }
        other => panic!("expected LlmUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_chain_is_llm_unavailable() {
    let c = chain(vec![]);
    assert!(matches!(c.generate("p", 1).await, Err(Error::LlmUnavailable { .. })));
}

#[tokio::test]
async fn hosted_providers_without_key_fail_auth() {
    let openai = OpenAiProvider::new("http://127.0.0.1:9", "m", None, Duration::from_secs(1));
    assert!(matches!(openai.send("p", 5).await, Err(ProviderError::Auth(_))));
    let gemini = GeminiProvider::new("http://127.0.0.1:9", "m", None, Duration::from_secs(1));
    assert!(matches!(gemini.send("p", 5).await, Err(ProviderError::Auth(_))));
}

#[tokio::test]
async fn unreachable_host_is_a_provider_failure() {
    let openai = OpenAiProvider::new("http://127.0.0.1:9/v1", "m", Some("k".into()), Duration::from_secs(2));
    assert!(openai.send("p", 5).await.is_err());
}

#[test]
fn build_chain_skips_missing_local_model() {
    let settings = LlmSettings {
        timeout_secs: 1,
        max_tokens: 16,
        providers: vec![
            ProviderSettings::Local { model_dir: Some("/no/such/model".into()), max_input_tokens: 128 },
            ProviderSettings::OpenAi {
                base_url: "http://localhost:1/v1".into(),
                model: "m".into(),
                api_key: None,
                api_key_env: None,
            },
        ],
    };
    assert_eq!(build_chain(&settings).provider_names(), vec!["openai"]);
}

#[test]
fn parses_chat_completion() {
    let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":" Use settings [S-0]. "}}]}"#;
    assert_eq!(parse_chat_completion(body).unwrap(), "Use settings [S-0].");
    assert!(matches!(parse_chat_completion(r#"{"choices":[]}"#), Err(ProviderError::Malformed(_))));
    assert!(matches!(parse_chat_completion("not json"), Err(ProviderError::Malformed(_))));
}

#[test]
fn parses_generate_content() {
    let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
    assert_eq!(parse_generate_content(body).unwrap(), "Hello there");
    assert!(matches!(parse_generate_content(r#"{"candidates":[]}"#), Err(ProviderError::Malformed(_))));
    assert!(matches!(
        parse_generate_content(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
        Err(ProviderError::Malformed(_))
    ));
}
