//! Explanation generation for duplicate candidates.
//!
//! Converts match signals into human-readable explanations suitable for
//! display in the web interface or CLI.

use serde::{Deserialize, Serialize};
use shelfmatch_model::{MatchCandidate, ProductComparison};

/// A structured explanation for one match signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// How strongly this signal supports a duplicate (0.0 - 1.0)
    pub weight: f64,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting a match signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Type of evidence
    pub kind: String,

    /// The specific value or match
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Signals that can be read off a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSignal {
    /// Titles cleared the threshold
    TitleSimilar { similarity: f64 },

    /// Maker / circle names are near-identical
    MakerMatch { maker: String },

    /// Both storefronts list a price
    PriceDifference { amount: i64 },
}

impl MatchSignal {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TitleSimilar { .. } => "Similar Title",
            Self::MakerMatch { .. } => "Same Circle",
            Self::PriceDifference { .. } => "Price Difference",
        }
    }
}

/// Confidence bands used in summaries.
pub fn confidence_level(similarity: f64) -> &'static str {
    if similarity >= 0.9 {
        "LIKELY DUPLICATE"
    } else if similarity >= 0.75 {
        "POSSIBLE DUPLICATE"
    } else {
        "WEAK MATCH"
    }
}

/// Collect the signals present on a candidate.
pub fn signals(candidate: &MatchCandidate<'_>) -> Vec<MatchSignal> {
    let mut signals = vec![MatchSignal::TitleSimilar {
        similarity: candidate.similarity,
    }];

    if candidate.maker_match {
        let maker = candidate
            .record_a
            .maker
            .clone()
            .or_else(|| candidate.record_b.maker.clone())
            .unwrap_or_default();
        signals.push(MatchSignal::MakerMatch { maker });
    }

    if let Some(amount) = candidate.price_difference() {
        signals.push(MatchSignal::PriceDifference { amount });
    }

    signals
}

/// Generate explanations for a candidate.
pub fn explain_candidate(candidate: &MatchCandidate<'_>) -> Vec<Explanation> {
    signals(candidate)
        .iter()
        .map(|signal| explain_signal(signal, candidate))
        .collect()
}

/// Generate the explanation for a single signal.
pub fn explain_signal(signal: &MatchSignal, candidate: &MatchCandidate<'_>) -> Explanation {
    let title_a = &candidate.record_a.title;
    let title_b = &candidate.record_b.title;

    match signal {
        MatchSignal::TitleSimilar { similarity } => Explanation {
            summary: format!("Titles {:.0}% similar", similarity * 100.0),
            detail: format!(
                "'{}' ({}) and '{}' ({}) score {:.2} after normalization.",
                title_a, candidate.record_a.platform, title_b, candidate.record_b.platform, similarity
            ),
            weight: *similarity,
            evidence: vec![
                EvidenceItem {
                    kind: "title".to_string(),
                    value: title_a.clone(),
                    context: Some(format!(
                        "{}:{}",
                        candidate.record_a.platform, candidate.record_a.platform_id
                    )),
                },
                EvidenceItem {
                    kind: "title".to_string(),
                    value: title_b.clone(),
                    context: Some(format!(
                        "{}:{}",
                        candidate.record_b.platform, candidate.record_b.platform_id
                    )),
                },
            ],
        },

        MatchSignal::MakerMatch { maker } => Explanation {
            summary: format!("Same circle '{}'", maker),
            detail: "Both listings name the same maker, which raised the score by a fixed bonus."
                .to_string(),
            weight: 0.2,
            evidence: vec![EvidenceItem {
                kind: "maker".to_string(),
                value: maker.clone(),
                context: None,
            }],
        },

        MatchSignal::PriceDifference { amount } => {
            let cheaper = match amount.signum() {
                1 => Some(candidate.record_b.platform),
                -1 => Some(candidate.record_a.platform),
                _ => None,
            };
            Explanation {
                summary: match cheaper {
                    Some(platform) => format!("{} cheaper on {}", amount.abs(), platform),
                    None => "Same price on both storefronts".to_string(),
                },
                detail: format!(
                    "Listed prices differ by {} ({} minus {}).",
                    amount, candidate.record_a.platform, candidate.record_b.platform
                ),
                weight: 0.0,
                evidence: vec![EvidenceItem {
                    kind: "price_difference".to_string(),
                    value: amount.to_string(),
                    context: None,
                }],
            }
        }
    }
}

/// One-line summary for a candidate.
pub fn summarize_candidate(candidate: &MatchCandidate<'_>) -> String {
    let labels: Vec<_> = signals(candidate).iter().map(|s| s.label()).collect();
    format!(
        "{}: {}",
        confidence_level(candidate.similarity),
        labels.join(", ")
    )
}

/// One-line verdict for a product comparison.
pub fn summarize_comparison(comparison: &ProductComparison) -> String {
    let verdict = if comparison.is_same_product {
        "SAME PRODUCT"
    } else {
        "DIFFERENT PRODUCTS"
    };

    let mut parts = vec![format!(
        "title {:.0}%",
        comparison.title_similarity * 100.0
    )];
    if comparison.maker_match {
        parts.push("same maker".to_string());
    }
    if let Some(advanced) = comparison.advanced_similarity {
        parts.push(format!("n-gram {:.0}%", advanced * 100.0));
    }
    if let (Some(diff), Some(pct)) = (comparison.price_difference, comparison.price_diff_percentage) {
        parts.push(format!("price diff {} ({:.1}%)", diff, pct));
    }

    format!("{}: {}", verdict, parts.join(", "))
}
