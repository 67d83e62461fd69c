//! One-off comparison of two products, outside of a catalog run.

use shelfmatch_features::{edit_ratio, ngram_cosine, normalize_quick_title, normalize_title};
use shelfmatch_model::{ProductComparison, ProductRecord};

/// Compare two individual products.
///
/// Titles are compared after the aggressive quick normalization, so edition
/// tags, volume numbers and punctuation do not count against a match. The
/// n-gram cosine is only reported when the products come from different
/// storefronts.
pub fn compare_products(p1: &ProductRecord, p2: &ProductRecord) -> ProductComparison {
    let title1 = normalize_quick_title(&p1.title);
    let title2 = normalize_quick_title(&p2.title);
    let title_similarity = if title1.is_empty() || title2.is_empty() {
        0.0
    } else {
        edit_ratio(&title1, &title2)
    };

    let maker_match = match (&p1.maker, &p2.maker) {
        (Some(m1), Some(m2)) => m1.to_lowercase() == m2.to_lowercase(),
        _ => false,
    };

    let (price_difference, price_diff_percentage) = match (p1.price, p2.price) {
        (Some(a), Some(b)) if a > 0 && b > 0 => {
            let diff = i64::from(a) - i64::from(b);
            let pct = diff.abs() as f64 / f64::from(a.max(b)) * 100.0;
            (Some(diff), Some(pct))
        }
        _ => (None, None),
    };

    let advanced_similarity = (p1.platform != p2.platform)
        .then(|| ngram_cosine(&normalize_title(&p1.title), &normalize_title(&p2.title)));

    let is_same_product = title_similarity > 0.9 || (title_similarity > 0.7 && maker_match);

    ProductComparison {
        title_similarity,
        maker_match,
        price_difference,
        price_diff_percentage,
        advanced_similarity,
        is_same_product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmatch_model::Platform;

    #[test]
    fn test_same_product_across_storefronts() {
        let dmm = ProductRecord::new(Platform::Dmm, "d_100", "【期間限定】夏休みの思い出 (DL版)")
            .with_maker("ひまわり堂")
            .with_price(1100);
        let dlsite = ProductRecord::new(Platform::Dlsite, "RJ100", "夏休みの思い出")
            .with_maker("ひまわり堂")
            .with_price(880);

        let cmp = compare_products(&dmm, &dlsite);
        assert_eq!(cmp.title_similarity, 1.0);
        assert!(cmp.maker_match);
        assert!(cmp.is_same_product);
        assert_eq!(cmp.price_difference, Some(220));
        assert!((cmp.price_diff_percentage.unwrap() - 20.0).abs() < 1e-9);
        assert!(cmp.advanced_similarity.is_some());
    }

    #[test]
    fn test_same_platform_skips_advanced_similarity() {
        let a = ProductRecord::new(Platform::Dmm, "d_1", "Summer Memories");
        let b = ProductRecord::new(Platform::Dmm, "d_2", "Winter Tales");
        let cmp = compare_products(&a, &b);
        assert_eq!(cmp.advanced_similarity, None);
        assert!(!cmp.is_same_product);
        assert_eq!(cmp.price_difference, None);
    }

    #[test]
    fn test_maker_match_lifts_moderate_titles() {
        // "summer memories" vs "summer memory": lcs 12 of 28 chars
        let a = ProductRecord::new(Platform::Dmm, "d_1", "Summer Memories").with_maker("Studio");
        let b = ProductRecord::new(Platform::Dlsite, "RJ1", "Summer Memory").with_maker("STUDIO");
        let cmp = compare_products(&a, &b);
        assert!(cmp.title_similarity > 0.7 && cmp.title_similarity <= 0.9);
        assert!(cmp.is_same_product);

        let c = ProductRecord::new(Platform::Dlsite, "RJ2", "Summer Memory").with_maker("Other");
        assert!(!compare_products(&a, &c).is_same_product);
    }

    #[test]
    fn test_title_of_only_digits_scores_zero() {
        let a = ProductRecord::new(Platform::Dmm, "d_1", "2024");
        let b = ProductRecord::new(Platform::Dlsite, "RJ1", "2024");
        assert_eq!(compare_products(&a, &b).title_similarity, 0.0);
    }
}
