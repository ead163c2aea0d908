//! Token-overlap scoring.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid regex"));

/// Case-folded alphanumeric tokens of `text`.
#[must_use]
pub fn tokenize(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Jaccard similarity of two token sets; 0.0 when either is empty.
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.union(b).count();
    shared as f64 / union as f64
}
