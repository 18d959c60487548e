//! PII masking applied once per document before tokenization.

use regex::Regex;
use std::sync::OnceLock;

pub const EMAIL_PLACEHOLDER: &str = "[EMAIL]";
pub const PHONE_PLACEHOLDER: &str = "[PHONE]";

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[\w.-]+@[\w.-]+\.\w+\b").expect("email pattern compiles"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}[-.\s]??\d{3}[-.\s]??\d{4}\b").expect("phone pattern compiles"))
}

fn redact_once(text: &str) -> String {
    let masked = email_re().replace_all(text, EMAIL_PLACEHOLDER);
    phone_re().replace_all(&masked, PHONE_PLACEHOLDER).into_owned()
}

/// Replace email-like and phone-like substrings with fixed placeholders.
///
/// Runs to a fixpoint, so `redact_pii(redact_pii(x)) == redact_pii(x)`. Every
/// changing pass removes at least one `@` or ten digits, which bounds the loop.
pub fn redact_pii(text: &str) -> String {
    let mut current = redact_once(text);
    loop {
        let next = redact_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
