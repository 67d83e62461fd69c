//! TF-IDF vector space over character n-grams.
//!
//! The space is fitted once over every title taking part in a run so that
//! vectors from both catalogs share one vocabulary. Weighting follows the
//! usual smoothed scheme: raw term counts times `ln((1 + N) / (1 + df)) + 1`,
//! with each document vector L2-normalized.

use crate::ngram_counts;
use std::collections::HashMap;
use thiserror::Error;

/// Terms present in more than this share of documents are pruned.
pub const MAX_DOCUMENT_FREQUENCY: f64 = 0.9;

/// Why a vector space could not be fitted.
#[derive(Debug, Error, PartialEq)]
pub enum VectorizeError {
    #[error("Cannot fit a vector space on an empty corpus")]
    EmptyCorpus,

    #[error("Corpus of {documents} documents is too small: any n-gram shared by two documents would be pruned")]
    CorpusTooSmall { documents: usize },

    #[error("No n-grams left after document-frequency pruning")]
    EmptyVocabulary,
}

/// An L2-normalized sparse vector, sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_weights(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(term, _)| *term);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        Self { entries }
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dot product of two normalized vectors, i.e. their cosine similarity.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, wa) = self.entries[i];
            let (tb, wb) = other.entries[j];
            match ta.cmp(&tb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// A fitted vector space plus the vectors of the documents it was fitted on.
#[derive(Debug, Clone)]
pub struct TfidfSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl TfidfSpace {
    /// Fit the space on `documents` and vectorize each of them.
    ///
    /// Documents keep their position: `vector(i)` belongs to `documents[i]`.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, VectorizeError> {
        let n_docs = documents.len();
        if n_docs == 0 {
            return Err(VectorizeError::EmptyCorpus);
        }

        let max_df = MAX_DOCUMENT_FREQUENCY * n_docs as f64;
        if max_df < 2.0 {
            return Err(VectorizeError::CorpusTooSmall { documents: n_docs });
        }

        let counts: Vec<HashMap<String, usize>> =
            documents.iter().map(|d| ngram_counts(d.as_ref())).collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for gram in doc.keys() {
                *document_frequency.entry(gram.as_str()).or_insert(0) += 1;
            }
        }

        // Sorted so that term indices do not depend on hash order
        let mut kept: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df as f64 <= max_df)
            .collect();
        if kept.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (gram, df)) in kept.into_iter().enumerate() {
            vocabulary.insert(gram.to_string(), index);
            idf.push(((1 + n_docs) as f64 / (1 + df) as f64).ln() + 1.0);
        }

        let mut space = Self {
            vocabulary,
            idf,
            vectors: Vec::with_capacity(n_docs),
        };
        space.vectors = counts.iter().map(|c| space.weigh(c)).collect();
        Ok(space)
    }

    fn weigh(&self, counts: &HashMap<String, usize>) -> SparseVector {
        let weights = counts
            .iter()
            .filter_map(|(gram, count)| {
                self.vocabulary
                    .get(gram)
                    .map(|&term| (term, *count as f64 * self.idf[term]))
            })
            .collect();
        SparseVector::from_weights(weights)
    }

    /// Vectorize text that was not part of the fitted corpus.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&ngram_counts(text))
    }

    /// Vector of the `index`-th fitted document.
    pub fn vector(&self, index: usize) -> Option<&SparseVector> {
        self.vectors.get(index)
    }

    /// Cosine similarity between two fitted documents, clamped to [0, 1].
    ///
    /// Unknown indices score 0.
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        match (self.vectors.get(a), self.vectors.get(b)) {
            (Some(va), Some(vb)) => va.dot(vb).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of fitted documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "新作 魔法少女の冒険 前編",
            "ドラゴン退治の記録",
            "夏休みの思い出",
            "魔法少女の冒険 前編",
            "宇宙船の航海日誌",
            "ドラゴン退治の記録 完全版",
        ]
    }

    #[test]
    fn test_fit_rejects_degenerate_corpora() {
        let empty: Vec<&str> = Vec::new();
        assert_eq!(TfidfSpace::fit(&empty).unwrap_err(), VectorizeError::EmptyCorpus);
        assert_eq!(
            TfidfSpace::fit(&["作品x", "作品x"]).unwrap_err(),
            VectorizeError::CorpusTooSmall { documents: 2 }
        );
        // Single characters produce no bigrams at all
        assert_eq!(
            TfidfSpace::fit(&["a", "b", "c"]).unwrap_err(),
            VectorizeError::EmptyVocabulary
        );
    }

    #[test]
    fn test_identical_documents_score_one() {
        let space = TfidfSpace::fit(&["summer memories", "summer memories", "winter tales"]).unwrap();
        assert!((space.cosine(0, 1) - 1.0).abs() < 1e-9);
        assert!(space.cosine(0, 2) < 0.5);
    }

    #[test]
    fn test_cosine_values() {
        let space = TfidfSpace::fit(&corpus()).unwrap();
        assert_eq!(space.len(), 6);
        assert!((space.cosine(0, 3) - 0.8098).abs() < 1e-3);
        assert!((space.cosine(1, 5) - 0.7468).abs() < 1e-3);
        assert_eq!(space.cosine(0, 4), 0.0);
        assert_eq!(space.cosine(0, 99), 0.0);
    }

    #[test]
    fn test_cosine_is_symmetric_and_bounded() {
        let space = TfidfSpace::fit(&corpus()).unwrap();
        for i in 0..space.len() {
            for j in 0..space.len() {
                let c = space.cosine(i, j);
                assert!((0.0..=1.0).contains(&c));
                assert!((c - space.cosine(j, i)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_frequent_terms_are_pruned() {
        // "ab" appears in every document and must not be in the vocabulary
        let space = TfidfSpace::fit(&["abx", "aby", "abz"]).unwrap();
        assert!(!space.vocabulary.contains_key("ab"));
        assert!(space.vocabulary.contains_key("bx"));
    }

    #[test]
    fn test_transform_unknown_text() {
        let space = TfidfSpace::fit(&corpus()).unwrap();
        assert!(space.transform("zzzz").is_zero());
        let v = space.transform("魔法少女の冒険 前編");
        assert!(v.nnz() > 0);
        assert!((v.dot(space.vector(3).unwrap()) - 1.0).abs() < 1e-9);
    }
}
