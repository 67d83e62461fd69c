//! Cross-catalog duplicate detection.
//!
//! Takes two catalogs of product records, scores every pair across them
//! and produces a ranked, capped list of likely duplicates.

mod compare;
mod scorer;

pub use compare::compare_products;
pub use scorer::{
    maker_boost, maker_boost_normalized, TitleScorer, MAKER_BONUS, MAKER_SIMILARITY_THRESHOLD,
};

use rayon::prelude::*;
use shelfmatch_features::{normalize_maker, normalize_title, strip_maker_affix};
use shelfmatch_model::{
    ConfigError, MatchCandidate, MatchConfiguration, MatchReport, PairOutcome, PairScore,
    ProductRecord, ScoringStrategy, SkipReason, SkippedPair,
};

/// A record with its per-run features computed once.
#[derive(Debug, Clone)]
struct PreparedRecord {
    title: String,
    maker: Option<String>,
    defect: Option<SkipReason>,
}

fn prepare(record: &ProductRecord, strip_maker: bool) -> PreparedRecord {
    let maker = record
        .maker
        .as_deref()
        .map(normalize_maker)
        .filter(|m| !m.is_empty());

    let mut title = normalize_title(&record.title);
    if strip_maker {
        if let Some(m) = &maker {
            title = strip_maker_affix(&title, m);
        }
    }

    let defect = if record.platform_id.trim().is_empty() {
        Some(SkipReason::MissingPlatformId {
            platform: record.platform,
        })
    } else if title.is_empty() {
        Some(SkipReason::EmptyTitle {
            platform: record.platform,
            platform_id: record.platform_id.clone(),
        })
    } else {
        None
    };

    PreparedRecord {
        title,
        maker,
        defect,
    }
}

enum RowItem {
    Accepted(usize, usize, PairScore),
    Skipped(SkippedPair),
}

/// Score a single pair of prepared records.
fn score_pair(
    scorer: &TitleScorer,
    i: usize,
    j: usize,
    a: &PreparedRecord,
    b: &PreparedRecord,
    use_circle_name: bool,
    ids: (&str, &str),
) -> PairOutcome {
    if let Some(reason) = a.defect.as_ref().or(b.defect.as_ref()) {
        return PairOutcome::Skipped(reason.clone());
    }

    let base_similarity = scorer.score(i, j, &a.title, &b.title);

    let (maker_bonus, maker_match) = if use_circle_name {
        maker_boost_normalized(a.maker.as_deref(), b.maker.as_deref())
    } else {
        (0.0, false)
    };

    let final_score = (base_similarity + maker_bonus).min(1.0);
    if !final_score.is_finite() {
        return PairOutcome::Skipped(SkipReason::NonFiniteScore {
            a_id: ids.0.to_string(),
            b_id: ids.1.to_string(),
        });
    }

    PairOutcome::Scored(PairScore {
        base_similarity,
        maker_bonus,
        final_score,
        maker_match,
    })
}

/// Sort candidates by similarity, highest first, and keep at most `max_results`.
///
/// The sort is stable, so equal scores keep their enumeration order.
pub fn rank<'a>(
    mut candidates: Vec<MatchCandidate<'a>>,
    max_results: usize,
) -> Vec<MatchCandidate<'a>> {
    candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    candidates.truncate(max_results);
    candidates
}

/// Find likely duplicates between catalog A and catalog B.
///
/// The configuration is validated before any work happens. Pairs that
/// cannot be scored are skipped and listed in the report; they never abort
/// the run.
pub fn find_matches<'a>(
    catalog_a: &'a [ProductRecord],
    catalog_b: &'a [ProductRecord],
    config: &MatchConfiguration,
) -> Result<MatchReport<'a>, ConfigError> {
    config.validate()?;

    let requested = if config.use_tf_idf {
        ScoringStrategy::TfIdfCosine
    } else {
        ScoringStrategy::EditDistance
    };

    if catalog_a.is_empty() || catalog_b.is_empty() || config.max_results == 0 {
        tracing::debug!(
            catalog_a = catalog_a.len(),
            catalog_b = catalog_b.len(),
            max_results = config.max_results,
            "Nothing to match"
        );
        return Ok(MatchReport::empty(requested));
    }

    tracing::info!(
        catalog_a = catalog_a.len(),
        catalog_b = catalog_b.len(),
        threshold = config.title_similarity_threshold,
        "Starting duplicate detection"
    );

    let prepared_a: Vec<PreparedRecord> = catalog_a
        .iter()
        .map(|r| prepare(r, config.strip_maker_from_title))
        .collect();
    let prepared_b: Vec<PreparedRecord> = catalog_b
        .iter()
        .map(|r| prepare(r, config.strip_maker_from_title))
        .collect();

    let titles_a: Vec<String> = prepared_a.iter().map(|p| p.title.clone()).collect();
    let titles_b: Vec<String> = prepared_b.iter().map(|p| p.title.clone()).collect();
    let scorer = TitleScorer::fit(&titles_a, &titles_b, config.use_tf_idf);

    let threshold = config.title_similarity_threshold;
    let row = |i: usize| -> Vec<RowItem> {
        let a = &prepared_a[i];
        prepared_b
            .iter()
            .enumerate()
            .filter_map(|(j, b)| {
                let ids = (
                    catalog_a[i].platform_id.as_str(),
                    catalog_b[j].platform_id.as_str(),
                );
                match score_pair(&scorer, i, j, a, b, config.use_circle_name, ids) {
                    PairOutcome::Scored(score) if score.final_score >= threshold => {
                        Some(RowItem::Accepted(i, j, score))
                    }
                    PairOutcome::Scored(_) => None,
                    PairOutcome::Skipped(reason) => Some(RowItem::Skipped(SkippedPair {
                        index_a: i,
                        index_b: j,
                        reason,
                    })),
                }
            })
            .collect()
    };

    // rayon collect keeps rows in A order, so both paths rank identically
    let items: Vec<RowItem> = if config.parallel {
        (0..catalog_a.len())
            .into_par_iter()
            .flat_map_iter(&row)
            .collect()
    } else {
        (0..catalog_a.len()).flat_map(&row).collect()
    };

    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for item in items {
        match item {
            RowItem::Accepted(i, j, score) => accepted.push(MatchCandidate {
                record_a: &catalog_a[i],
                record_b: &catalog_b[j],
                similarity: score.final_score,
                maker_match: score.maker_match,
            }),
            RowItem::Skipped(pair) => {
                tracing::debug!(
                    index_a = pair.index_a,
                    index_b = pair.index_b,
                    reason = %pair.reason,
                    "Skipped pair"
                );
                skipped.push(pair);
            }
        }
    }

    let accepted_before_cap = accepted.len();
    let candidates = rank(accepted, config.max_results);

    tracing::info!(
        strategy = scorer.strategy().label(),
        accepted = accepted_before_cap,
        returned = candidates.len(),
        skipped = skipped.len(),
        "Duplicate detection finished"
    );

    Ok(MatchReport {
        candidates,
        skipped,
        strategy: scorer.strategy(),
        pairs_considered: catalog_a.len() * catalog_b.len(),
        accepted_before_cap,
    })
}

/// Ranked candidates only, for callers that do not need the run report.
pub fn match_catalogs<'a>(
    catalog_a: &'a [ProductRecord],
    catalog_b: &'a [ProductRecord],
    config: &MatchConfiguration,
) -> Result<Vec<MatchCandidate<'a>>, ConfigError> {
    find_matches(catalog_a, catalog_b, config).map(|report| report.candidates)
}
