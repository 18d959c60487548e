use agentdesk_core::redact::redact_pii;
use agentdesk_core::types::Document;
use proptest::prelude::*;

#[test]
fn masks_email_and_phone() {
    let out = redact_pii("Reach me at john.doe@example.com or 555.867.5309 today");
    assert_eq!(out, "Reach me at [EMAIL] or [PHONE] today");
}

#[test]
fn leaves_plain_text_untouched() {
    let text = "Order 1234 shipped in 12 days";
    assert_eq!(redact_pii(text), text);
}

#[test]
fn document_without_redaction_keeps_text() {
    let doc = Document::new("a", "x@y.com", false);
    assert_eq!(doc.redacted_text, "x@y.com");
    assert_eq!(doc.content_hash(), Document::new("b", "x@y.com", false).content_hash());
}

proptest! {
    #[test]
    fn redaction_is_idempotent(text in "[a-z0-9@. \\-]{0,120}") {
        let once = redact_pii(&text);
        prop_assert_eq!(redact_pii(&once), once.clone());
    }
}
