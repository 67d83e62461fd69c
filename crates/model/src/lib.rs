//! Core domain model for shelfmatch cross-storefront duplicate detection.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `ProductRecord`: One catalog entry from a storefront
//! - `Platform`: Which storefront a record came from
//! - `MatchCandidate`: A scored pair of records, borrowed from the caller
//! - `MatchConfiguration`: Per-run parameters for the matching engine
//! - `PairOutcome`: What happened to a single pair during a run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building model values from external input.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}

/// A configuration that must not be used for a run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Title similarity threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("max_results must not be negative, got {0}")]
    NegativeMaxResults(i64),
}

/// The storefront a product record was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Storefront A
    Dmm,
    /// Storefront B
    Dlsite,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dmm => "dmm",
            Self::Dlsite => "dlsite",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dmm" | "a" => Ok(Self::Dmm),
            "dlsite" | "b" => Ok(Self::Dlsite),
            other => Err(ModelError::UnknownPlatform(other.to_string())),
        }
    }
}

/// A single product as delivered by the ingestion layer.
///
/// Only `platform`, `platform_id` and `title` are guaranteed to be populated.
/// Everything else is optional and its absence means "no signal".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Storefront this record belongs to
    pub platform: Platform,

    /// Storefront-specific identifier (e.g. "d_123456", "RJ01012345")
    pub platform_id: String,

    /// Title as listed on the storefront
    #[serde(default)]
    pub title: String,

    /// Maker / circle name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker: Option<String>,

    /// List price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,

    /// Sale price, if discounted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Release date (ISO format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductRecord {
    /// Create a minimal record.
    pub fn new(
        platform: Platform,
        platform_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            platform_id: platform_id.into(),
            title: title.into(),
            maker: None,
            price: None,
            discount_price: None,
            url: None,
            thumbnail_url: None,
            release_date: None,
            category: None,
        }
    }

    pub fn with_maker(mut self, maker: impl Into<String>) -> Self {
        self.maker = Some(maker.into());
        self
    }

    pub fn with_price(mut self, price: u32) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The price a buyer would pay right now.
    pub fn effective_price(&self) -> Option<u32> {
        self.discount_price.or(self.price)
    }
}

/// A scored pair of records that cleared the similarity threshold.
///
/// Both records are borrowed from the caller's catalogs, so the full
/// metadata stays reachable without copying.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchCandidate<'a> {
    /// Record from catalog A
    pub record_a: &'a ProductRecord,

    /// Record from catalog B
    pub record_b: &'a ProductRecord,

    /// Final score in [0, 1], maker bonus included
    pub similarity: f64,

    /// Whether the maker bonus was applied
    pub maker_match: bool,
}

impl MatchCandidate<'_> {
    /// Price of the A record minus price of the B record, when both are known.
    pub fn price_difference(&self) -> Option<i64> {
        match (self.record_a.price, self.record_b.price) {
            (Some(a), Some(b)) => Some(i64::from(a) - i64::from(b)),
            _ => None,
        }
    }
}

/// Parameters for a single matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfiguration {
    /// Minimum final score to accept a match
    #[serde(default = "default_threshold")]
    pub title_similarity_threshold: f64,

    /// Enable the maker / circle name bonus
    #[serde(default = "default_true")]
    pub use_circle_name: bool,

    /// Use TF-IDF cosine instead of the edit-distance ratio
    #[serde(default = "default_true")]
    pub use_tf_idf: bool,

    /// Cap on returned matches
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Drop a leading/trailing maker name from titles before scoring
    #[serde(default = "default_true")]
    pub strip_maker_from_title: bool,

    /// Score catalog A rows on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

fn default_threshold() -> f64 {
    0.75
}

fn default_max_results() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for MatchConfiguration {
    fn default() -> Self {
        Self {
            title_similarity_threshold: default_threshold(),
            use_circle_name: true,
            use_tf_idf: true,
            max_results: default_max_results(),
            strip_maker_from_title: true,
            parallel: false,
        }
    }
}

impl MatchConfiguration {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.title_similarity_threshold = threshold;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_tf_idf(mut self, use_tf_idf: bool) -> Self {
        self.use_tf_idf = use_tf_idf;
        self
    }

    pub fn with_circle_name(mut self, use_circle_name: bool) -> Self {
        self.use_circle_name = use_circle_name;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject configurations that cannot be applied uniformly to a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.title_similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            // NaN fails the range check as well
            return Err(ConfigError::ThresholdOutOfRange(t));
        }
        Ok(())
    }
}

/// Which scoring strategy a run actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    TfIdfCosine,
    EditDistance,
}

impl ScoringStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TfIdfCosine => "tf-idf cosine",
            Self::EditDistance => "edit distance",
        }
    }
}

/// Why a pair was left out of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum SkipReason {
    /// One of the records has a blank platform id
    MissingPlatformId { platform: Platform },

    /// One of the records has no usable title
    EmptyTitle {
        platform: Platform,
        platform_id: String,
    },

    /// Scoring produced NaN or infinity
    NonFiniteScore { a_id: String, b_id: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPlatformId { platform } => {
                write!(f, "{} record without platform id", platform)
            }
            Self::EmptyTitle {
                platform,
                platform_id,
            } => write!(f, "{}:{} has an empty title", platform, platform_id),
            Self::NonFiniteScore { a_id, b_id } => {
                write!(f, "non-finite score for {} / {}", a_id, b_id)
            }
        }
    }
}

/// Score of a pair that could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    /// Title similarity before the maker bonus
    pub base_similarity: f64,

    /// Bonus contributed by the maker booster (0.0 or the fixed bonus)
    pub maker_bonus: f64,

    /// min(base + bonus, 1.0)
    pub final_score: f64,

    pub maker_match: bool,
}

/// Result of scoring one (A, B) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Scored(PairScore),
    Skipped(SkipReason),
}

/// A pair that was skipped, with its position in the cross product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    pub index_a: usize,
    pub index_b: usize,
    pub reason: SkipReason,
}

/// Everything a matching run produced.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport<'a> {
    /// Ranked and capped candidates
    pub candidates: Vec<MatchCandidate<'a>>,

    /// Pairs that could not be scored
    pub skipped: Vec<SkippedPair>,

    /// Strategy that scored the titles (after any fallback)
    pub strategy: ScoringStrategy,

    /// Size of the cross product that was enumerated
    pub pairs_considered: usize,

    /// Candidates above threshold before the result cap
    pub accepted_before_cap: usize,
}

impl<'a> MatchReport<'a> {
    pub fn empty(strategy: ScoringStrategy) -> Self {
        Self {
            candidates: Vec::new(),
            skipped: Vec::new(),
            strategy,
            pairs_considered: 0,
            accepted_before_cap: 0,
        }
    }
}

/// Side-by-side comparison of two individual products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductComparison {
    /// Ratio over titles with bracketed text, digits and punctuation removed
    pub title_similarity: f64,

    /// Case-insensitive maker equality
    pub maker_match: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_difference: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_diff_percentage: Option<f64>,

    /// N-gram cosine, only computed across platforms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_similarity: Option<f64>,

    pub is_same_product: bool,
}
