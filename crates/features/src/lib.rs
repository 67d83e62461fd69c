//! Feature extraction for cross-storefront product matching.
//!
//! Provides pure functions for computing features used in scoring:
//! - Title and maker normalization
//! - Character n-gram generation
//! - Edit-distance similarity ratio
//! - TF-IDF vector space over character n-grams (see [`tfidf`])

pub mod tfidf;

pub use tfidf::{SparseVector, TfidfSpace, VectorizeError};

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Bracket glyphs that storefronts wrap around circle names, tags and editions.
pub const BRACKET_GLYPHS: [char; 14] = [
    '【', '】', '「', '」', '『', '』', '（', '）', '[', ']', '(', ')', '{', '}',
];

/// N-gram sizes used for vector scoring.
pub const NGRAM_SIZES: [usize; 2] = [2, 3];

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a title for vector and edit-distance scoring.
///
/// Lowercases, turns every bracket glyph into a space (the bracketed text
/// itself is kept), collapses whitespace and trims.
pub fn normalize_title(title: &str) -> String {
    let replaced: String = title
        .to_lowercase()
        .chars()
        .map(|c| if BRACKET_GLYPHS.contains(&c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&replaced)
}

/// Normalize a maker / circle name.
///
/// Same as [`normalize_title`] except bracket glyphs are dropped without
/// leaving a space behind. Digits and other punctuation are kept.
pub fn normalize_maker(maker: &str) -> String {
    let stripped: String = maker
        .to_lowercase()
        .chars()
        .filter(|c| !BRACKET_GLYPHS.contains(c))
        .collect();
    collapse_whitespace(&stripped)
}

static BRACKETED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"【[^】]*】|\[[^\]]*\]|\([^)]*\)").expect("static regex")
});

static NON_WORD_OR_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]|[0-9]").expect("static regex"));

/// Aggressive title normalization for one-off product comparison.
///
/// Unlike [`normalize_title`] this removes bracketed text entirely, along
/// with punctuation and ASCII digits.
pub fn normalize_quick_title(title: &str) -> String {
    let without_brackets = BRACKETED_TEXT.replace_all(title, "");
    let words_only = NON_WORD_OR_DIGIT.replace_all(&without_brackets, "");
    collapse_whitespace(&words_only).to_lowercase()
}

/// Remove a maker name from the start or end of a title.
///
/// Both arguments must already be normalized. The maker has to be separated
/// from the rest of the title by a space, and something must remain.
pub fn strip_maker_affix(title: &str, maker: &str) -> String {
    if maker.is_empty() {
        return title.to_string();
    }

    if let Some(rest) = title.strip_prefix(maker) {
        if rest.starts_with(' ') && !rest.trim().is_empty() {
            return rest.trim().to_string();
        }
    }

    if let Some(rest) = title.strip_suffix(maker) {
        if rest.ends_with(' ') && !rest.trim().is_empty() {
            return rest.trim().to_string();
        }
    }

    title.to_string()
}

/// Generate character n-grams of a single size.
///
/// Text shorter than `n` yields nothing.
pub fn generate_ngrams(text: &str, n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    text.chars()
        .collect::<Vec<_>>()
        .windows(n)
        .map(|w| w.iter().collect())
        .collect()
}

/// Term counts over all n-gram sizes in [`NGRAM_SIZES`].
pub fn ngram_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for n in NGRAM_SIZES {
        for gram in generate_ngrams(text, n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// Length of the longest common subsequence, by chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity ratio derived from edit distance.
///
/// Insertions and deletions cost 1 (a substitution costs 2), so the ratio is
/// `1 - distance / (len(a) + len(b))`. Identical strings score 1.0, strings
/// without a single common character score 0.0.
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Cosine similarity of raw n-gram counts, without corpus weighting.
///
/// Used where there is no corpus to fit a vector space on.
pub fn ngram_cosine(a: &str, b: &str) -> f64 {
    let counts_a = ngram_counts(a);
    let counts_b = ngram_counts(b);

    let dot: f64 = counts_a
        .iter()
        .filter_map(|(gram, ca)| counts_b.get(gram).map(|cb| (*ca * *cb) as f64))
        .sum();
    let norm_a = counts_a.values().map(|c| (c * c) as f64).sum::<f64>().sqrt();
    let norm_b = counts_b.values().map(|c| (c * c) as f64).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("【新作】魔法少女の冒険  前編"), "新作 魔法少女の冒険 前編");
        assert_eq!(normalize_title("  Summer (Deluxe)  Edition "), "summer deluxe edition");
        assert_eq!(normalize_title("「A」『B』{C}[D]"), "a b c d");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_normalize_maker() {
        assert_eq!(normalize_maker("【ABCサークル】"), "abcサークル");
        assert_eq!(normalize_maker("Studio (Moon)  2nd!"), "studio moon 2nd!");
        assert_eq!(normalize_maker("   "), "");
    }

    #[test]
    fn test_normalize_quick_title() {
        assert_eq!(normalize_quick_title("【予約】作品X Vol.2 (DL版)"), "作品x vol");
        assert_eq!(normalize_quick_title("[Circle] Title: Part 3"), "title part");
        assert_eq!(normalize_quick_title(""), "");
    }

    #[test]
    fn test_strip_maker_affix() {
        assert_eq!(strip_maker_affix("abcサークル 作品x", "abcサークル"), "作品x");
        assert_eq!(strip_maker_affix("作品x abcサークル", "abcサークル"), "作品x");
        // No separator, so the maker may be part of a word
        assert_eq!(strip_maker_affix("abcサークル作品x", "abcサークル"), "abcサークル作品x");
        // Never strip down to nothing
        assert_eq!(strip_maker_affix("abcサークル", "abcサークル"), "abcサークル");
        assert_eq!(strip_maker_affix("作品x", ""), "作品x");
    }

    #[test]
    fn test_ngrams() {
        assert_eq!(generate_ngrams("nike", 2), vec!["ni", "ik", "ke"]);
        assert_eq!(generate_ngrams("作品x", 3), vec!["作品x"]);
        assert!(generate_ngrams("a", 2).is_empty());
    }

    #[test]
    fn test_ngram_counts() {
        let counts = ngram_counts("abab");
        assert_eq!(counts.get("ab"), Some(&2));
        assert_eq!(counts.get("ba"), Some(&1));
        assert_eq!(counts.get("aba"), Some(&1));
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_edit_ratio() {
        assert_eq!(edit_ratio("作品x", "作品x"), 1.0);
        assert_eq!(edit_ratio("", ""), 1.0);
        assert_eq!(edit_ratio("abc", ""), 0.0);
        assert_eq!(edit_ratio("abc", "xyz"), 0.0);
        // lcs("kitten", "sitting") = 4
        assert!((edit_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_ngram_cosine() {
        assert!((ngram_cosine("作品x", "作品x") - 1.0).abs() < 1e-12);
        assert_eq!(ngram_cosine("abc", "xyz"), 0.0);
        assert_eq!(ngram_cosine("a", "abc"), 0.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_title_idempotent(s in "\\PC{0,40}") {
            let once = normalize_title(&s);
            prop_assert_eq!(normalize_title(&once), once);
        }

        #[test]
        fn prop_normalize_maker_idempotent(s in "\\PC{0,40}") {
            let once = normalize_maker(&s);
            prop_assert_eq!(normalize_maker(&once), once);
        }

        #[test]
        fn prop_edit_ratio_bounded_and_symmetric(a in "\\PC{0,20}", b in "\\PC{0,20}") {
            let r = edit_ratio(&a, &b);
            prop_assert!((0.0..=1.0).contains(&r));
            prop_assert_eq!(r, edit_ratio(&b, &a));
        }
    }
}
