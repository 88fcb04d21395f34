//! Tokenization and term-count vectors

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9_-]*").expect("word pattern"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
        "each", "either", "else", "etc", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "her", "here", "hers", "him", "his", "how", "however", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more", "most", "must",
        "my", "neither", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
        "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some",
        "such", "than", "that", "the", "their", "theirs", "them", "then", "there", "these",
        "they", "this", "those", "through", "to", "too", "under", "until", "up", "upon", "very",
        "was", "we", "were", "what", "when", "where", "whether", "which", "while", "who", "whom",
        "why", "will", "with", "within", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercased words of at least two characters, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= 2 && !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// Raw term frequencies of `text`.
pub fn term_counts(text: &str) -> HashMap<String, f32> {
    let mut counts = HashMap::new();
    for term in tokenize(text) {
        *counts.entry(term).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of two sparse vectors; 0.0 when either is empty.
pub fn cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f32 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Term-frequency cosine similarity of two texts.
pub fn text_similarity(a: &str, b: &str) -> f32 {
    cosine(&term_counts(a), &term_counts(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("The UE shall send a REGISTER request to the AMF");
        assert_eq!(tokens, vec!["ue", "shall", "send", "register", "request", "amf"]);
    }

    #[test]
    fn test_identical_texts_are_fully_similar() {
        let score = text_similarity("attach procedure timer", "attach procedure timer");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(text_similarity("attach request", "detach accept"), 0.0);
        assert_eq!(text_similarity("", "detach accept"), 0.0);
    }
}
