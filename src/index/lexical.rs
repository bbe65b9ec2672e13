//! Lexical leg of hybrid scoring.

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "of",
    "on", "or", "that", "the", "to", "was", "were", "with",
];

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Fraction of the query's content tokens that appear in `text`, in `[0, 1]`.
///
/// Asymmetric on purpose: it measures how much of the query a hit covers,
/// not how much of the hit is query-relevant.
pub fn lexical_score(query: &str, text: &str) -> f32 {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens = tokens(text);
    let overlap = query_tokens.intersection(&text_tokens).count();
    overlap as f32 / query_tokens.len() as f32
}
