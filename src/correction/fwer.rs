//! Family-wise error p-values from a sorted maximum-statistic null.
//!
//! For `P` sorted permutation maxima and an observed statistic `t`, let
//! `idx` be the number of maxima strictly below `|t|` (a right-biased
//! binary search). The p-value is `(P − idx + 1) / P`, capped at 1, so a
//! statistic beating every maximum scores `1/P` and never 0.
use crate::utils::nan_to_zero;

/// FWER p-value of `stat` against ascending `sorted_null`.
///
/// NaN statistics are scored as 0. An empty null yields 1.
pub fn fwer_pvalue(sorted_null: &[f64], stat: f64) -> f64 {
    let p = sorted_null.len();
    if p == 0 {
        return 1.0;
    }
    let target = nan_to_zero(stat).abs();
    let idx = sorted_null.partition_point(|&v| v < target);
    ((p - idx + 1) as f64 / p as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exceeding_every_maximum_gives_one_over_p() {
        for p in [1usize, 7, 1000] {
            let null: Vec<f64> = (0..p).map(|i| i as f64 / p as f64).collect();
            assert_eq!(fwer_pvalue(&null, 5.0), 1.0 / p as f64);
        }
    }

    #[test]
    // Purpose
    // -------
    // Pin the rank convention at the boundaries.
    //
    // Given
    // -----
    // - Null [1, 2, 3, 4].
    //
    // Expect
    // ------
    // - |t| ≤ 1 → 1.0; t = 2.5 → 3/4; t = -3.5 → 2/4; NaN → 1.0.
    fn rank_convention_at_boundaries() {
        let null = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(fwer_pvalue(&null, 0.5), 1.0);
        assert_eq!(fwer_pvalue(&null, 1.0), 1.0);
        assert_eq!(fwer_pvalue(&null, 2.5), 0.75);
        assert_eq!(fwer_pvalue(&null, -3.5), 0.5);
        assert_eq!(fwer_pvalue(&null, f64::NAN), 1.0);
        assert_eq!(fwer_pvalue(&[], 3.0), 1.0);
    }

    proptest! {
        #[test]
        // Purpose
        // -------
        // A larger statistic never receives a larger p-value.
        fn pvalue_is_monotone_in_statistic(
            mut null in proptest::collection::vec(0.0f64..10.0, 1..200),
            a in 0.0f64..12.0,
            b in 0.0f64..12.0,
        ) {
            null.sort_by(|x, y| x.total_cmp(y));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(fwer_pvalue(&null, hi) <= fwer_pvalue(&null, lo));
        }
    }
}
