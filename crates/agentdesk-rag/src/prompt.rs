//! Grounded prompt rendering with `[S-i]` citation labels.

use regex::Regex;
use std::sync::OnceLock;

use agentdesk_core::types::RetrievalHit;

pub const BLOCK_DELIMITER: &str = "\n---\n";

const PREAMBLE: &str = "You are a helpful assistant. Use the context to answer.";

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[\s*S\s*-\s*(\d+)\s*\]").expect("label pattern compiles"))
}

pub fn label(i: usize) -> String {
    format!("[S-{i}]")
}

/// Rewrite label-shaped text so only composer-issued labels remain.
pub fn neutralize_labels(text: &str) -> String {
    label_re().replace_all(text, "(S-$1)").into_owned()
}

/// Indices of every `[S-i]` label present in `prompt`, in order of appearance.
pub fn cited_labels(prompt: &str) -> Vec<usize> {
    label_re()
        .captures_iter(prompt)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}

/// One `[S-i]` block per hit in rank order, then the question and answer
/// instruction. With no hits no label is emitted.
pub fn compose(query_text: &str, hits: &[RetrievalHit]) -> String {
    let query = neutralize_labels(query_text);
    if hits.is_empty() {
        return format!(
            "{PREAMBLE}\n\nContext:\n(no sources available)\n\nQuestion: {query}\n\n\
             Answer (be concise; no sources are available, so do not include citations):"
        );
    }
    let blocks: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                "{} ({} chunk:{})\n{}\n",
                label(i),
                neutralize_labels(&h.payload.doc_id),
                h.payload.chunk_id,
                neutralize_labels(&h.payload.text)
            )
        })
        .collect();
    let labels: Vec<String> = (0..hits.len()).map(label).collect();
    format!(
        "{PREAMBLE} Cite sources inline using the labels {} where appropriate.\n\n\
         Context:\n{}\n\nQuestion: {query}\n\n\
         Answer (be concise, and include citations like {} when you use a source):",
        labels.join(", "),
        blocks.join(BLOCK_DELIMITER),
        labels[0]
    )
}
