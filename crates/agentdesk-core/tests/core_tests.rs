use std::fs;
use std::io::Write;
use tempfile::TempDir;

use agentdesk_core::config::{expand_path, resolve_with_base, Config, ProviderSettings};
use agentdesk_core::data_processor::DataProcessor;
use agentdesk_core::Error;
use figment::providers::{Format, Toml};
use figment::Figment;

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::default();
    let docs = processor.load_directory(dir).expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id, "a.txt");
    assert_eq!(docs[0].full_text.trim(), "Short text");
}

#[test]
fn load_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.md"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let docs = DataProcessor::default().load_directory_limited(dir, 1).expect("load limited");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id, "a.md", "listing is sorted");
}

#[test]
fn list_files_filters_extensions_and_recurses() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("keep.md"), "x").unwrap();
    fs::write(dir.join("nested/keep.TXT"), "x").unwrap();
    fs::write(dir.join("skip.pdf"), "x").unwrap();

    let processor = DataProcessor::new(vec![".md".into(), "txt".into()], false);
    let files = processor.list_files(dir);
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["keep.md", "keep.TXT"]);
}

#[test]
fn same_file_name_in_different_folders_gets_distinct_doc_ids() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir(dir.join("hr")).unwrap();
    fs::create_dir(dir.join("it")).unwrap();
    fs::write(dir.join("hr/faq.md"), "Vacation policy").unwrap();
    fs::write(dir.join("it/faq.md"), "VPN setup").unwrap();
    fs::write(dir.join("readme.md"), "Top level").unwrap();

    let docs = DataProcessor::default().load_directory(dir).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["hr/faq.md", "it/faq.md", "readme.md"]);
}

#[test]
fn load_document_redacts_and_tolerates_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bin.txt");
    let mut bytes = b"mail jane@example.com now ".to_vec();
    bytes.push(0xff);
    fs::write(&path, bytes).unwrap();

    let doc = DataProcessor::new(vec!["txt".into()], true).load_document(&path).unwrap();
    assert!(doc.full_text.contains("jane@example.com"));
    assert!(doc.redacted_text.contains("[EMAIL]"));
    assert!(!doc.redacted_text.contains("jane@example.com"));
    assert!(doc.redacted_text.contains('\u{fffd}'));
}

#[test]
fn settings_defaults_are_valid() {
    let settings = Config::from_figment(Figment::new()).settings().expect("defaults validate");
    assert_eq!(settings.chunking.chunk_tokens, 500);
    assert_eq!(settings.chunking.overlap, 50);
    assert_eq!(settings.index.collection, "agentdesk_docs");
    assert_eq!(settings.retrieval.coarse_limit, 50);
    assert_eq!(settings.ingest.batch_size, 100);
    assert_eq!(settings.llm.providers.len(), 3);
    assert_eq!(settings.llm.providers[0].kind(), "local");
}

#[test]
fn settings_merge_toml_over_defaults() {
    let toml = r#"
        [chunking]
        chunk_tokens = 128
        overlap = 16

        [[llm.providers]]
        kind = "openai"
        base_url = "http://localhost:8080/v1"
        model = "tiny"
    "#;
    let cfg = Config::from_figment(Figment::new().merge(Toml::string(toml)));
    let settings = cfg.settings().unwrap();
    assert_eq!(settings.chunking.chunk_tokens, 128);
    assert_eq!(settings.chunking.overlap, 16);
    assert!(settings.chunking.redact_pii, "untouched fields keep defaults");
    assert_eq!(settings.llm.providers.len(), 1);
    assert!(matches!(&settings.llm.providers[0], ProviderSettings::OpenAi { model, api_key: None, .. } if model == "tiny"));
    assert_eq!(settings.router.ticket_priority, "medium");
}

#[test]
fn settings_reject_overlap_not_below_chunk_size() {
    let toml = "[chunking]\nchunk_tokens = 10\noverlap = 10\n";
    let err = Config::from_figment(Figment::new().merge(Toml::string(toml))).settings().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn settings_reject_zero_batch_size() {
    let toml = "[ingest]\nbatch_size = 0\n";
    let err = Config::from_figment(Figment::new().merge(Toml::string(toml))).settings().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn expand_and_resolve_paths() {
    std::env::set_var("AGENTDESK_TEST_DIR", "/opt/data");
    assert_eq!(expand_path("${AGENTDESK_TEST_DIR}/db"), std::path::PathBuf::from("/opt/data/db"));
    let base = std::path::Path::new("/srv");
    assert_eq!(resolve_with_base(base, "rel/x"), std::path::PathBuf::from("/srv/rel/x"));
    assert_eq!(resolve_with_base(base, "/abs/x"), std::path::PathBuf::from("/abs/x"));
}
