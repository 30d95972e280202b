// src/instance/source.rs

use std::sync::OnceLock;

use regex::Regex;

fn graph_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Non-greedy: one block ends at the first closing brace.
    RE.get_or_init(|| Regex::new(r"(?s)\bgraph\s+\w+\s*\{.*?\}").expect("valid regex"))
}

/// Return every `graph <name> { ... }` block in `text`, in order.
pub fn extract_graph_blocks(text: &str) -> Vec<&str> {
    graph_block_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}
