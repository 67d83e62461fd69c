//! Title similarity strategies and the maker booster.

use shelfmatch_features::{edit_ratio, normalize_maker, TfidfSpace};
use shelfmatch_model::ScoringStrategy;

/// Maker similarity above which two makers count as the same circle.
pub const MAKER_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Fixed bonus added to the title score when makers match.
pub const MAKER_BONUS: f64 = 0.2;

/// Scores normalized titles of catalog A against catalog B.
#[derive(Debug)]
pub enum TitleScorer {
    /// Vector space fitted over A titles followed by B titles
    TfIdf { space: TfidfSpace, offset_b: usize },
    EditDistance,
}

impl TitleScorer {
    /// Build the scorer for a run.
    ///
    /// When the vector space cannot be fitted the run falls back to the
    /// edit-distance ratio.
    pub fn fit(titles_a: &[String], titles_b: &[String], use_tf_idf: bool) -> Self {
        if !use_tf_idf {
            return Self::EditDistance;
        }

        let corpus: Vec<&str> = titles_a
            .iter()
            .chain(titles_b.iter())
            .map(String::as_str)
            .collect();

        match TfidfSpace::fit(&corpus) {
            Ok(space) => {
                tracing::debug!(
                    documents = space.len(),
                    vocabulary = space.vocabulary_len(),
                    "Fitted title vector space"
                );
                Self::TfIdf {
                    space,
                    offset_b: titles_a.len(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Vectorization failed, falling back to edit distance");
                Self::EditDistance
            }
        }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        match self {
            Self::TfIdf { .. } => ScoringStrategy::TfIdfCosine,
            Self::EditDistance => ScoringStrategy::EditDistance,
        }
    }

    /// Similarity of A title `i` and B title `j`, in [0, 1].
    pub fn score(&self, i: usize, j: usize, title_a: &str, title_b: &str) -> f64 {
        match self {
            Self::TfIdf { space, offset_b } => space.cosine(i, offset_b + j),
            Self::EditDistance => edit_ratio(title_a, title_b),
        }
    }
}

/// Bonus and match flag for two already-normalized makers.
///
/// Absent or empty makers give no signal.
pub fn maker_boost_normalized(maker_a: Option<&str>, maker_b: Option<&str>) -> (f64, bool) {
    match (maker_a, maker_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            if edit_ratio(a, b) > MAKER_SIMILARITY_THRESHOLD {
                (MAKER_BONUS, true)
            } else {
                (0.0, false)
            }
        }
        _ => (0.0, false),
    }
}

/// Bonus and match flag for two raw maker names.
pub fn maker_boost(maker_a: Option<&str>, maker_b: Option<&str>) -> (f64, bool) {
    let a = maker_a.map(normalize_maker);
    let b = maker_b.map(normalize_maker);
    maker_boost_normalized(a.as_deref(), b.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_small_corpus_falls_back() {
        let scorer = TitleScorer::fit(&titles(&["作品x"]), &titles(&["作品x"]), true);
        assert_eq!(scorer.strategy(), ScoringStrategy::EditDistance);
        assert_eq!(scorer.score(0, 0, "作品x", "作品x"), 1.0);
    }

    #[test]
    fn test_edit_distance_when_requested() {
        let a = titles(&["summer memories", "winter tales", "spring song"]);
        let scorer = TitleScorer::fit(&a, &a, false);
        assert_eq!(scorer.strategy(), ScoringStrategy::EditDistance);
    }

    #[test]
    fn test_tfidf_uses_b_offset() {
        let a = titles(&["魔法少女の冒険 前編", "ドラゴン退治の記録"]);
        let b = titles(&["宇宙船の航海日誌", "魔法少女の冒険 前編"]);
        let scorer = TitleScorer::fit(&a, &b, true);
        assert_eq!(scorer.strategy(), ScoringStrategy::TfIdfCosine);
        assert!((scorer.score(0, 1, &a[0], &b[1]) - 1.0).abs() < 1e-9);
        assert_eq!(scorer.score(0, 0, &a[0], &b[0]), 0.0);
    }

    #[test]
    fn test_maker_boost() {
        assert_eq!(maker_boost(Some("ABCサークル"), Some("【abcサークル】")), (MAKER_BONUS, true));
        assert_eq!(maker_boost(Some("ABCサークル"), None), (0.0, false));
        assert_eq!(maker_boost(Some("ABCサークル"), Some("XYZ工房")), (0.0, false));
        assert_eq!(maker_boost(Some("()"), Some("[]")), (0.0, false));
    }

    #[test]
    fn test_maker_boost_requires_more_than_ninety_percent() {
        // ratio = 2 * 9 / 20 = 0.9 exactly, which is not enough
        assert_eq!(maker_boost_normalized(Some("abcdefghij"), Some("abcdefghiz")), (0.0, false));
        // ratio = 2 * 10 / 21, just above the cutoff
        assert_eq!(maker_boost_normalized(Some("abcdefghij"), Some("abcdefghijk")), (MAKER_BONUS, true));
    }
}
