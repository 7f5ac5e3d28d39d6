//! Qualitative labels derived from fare statistics.
//!
//! The thresholds encode product policy rather than statistics, so they
//! all come from [`InsightConfig`].

use campus_fares_analytics_models::{
    ConsensusThresholds, InsightConfig, ReliabilityThresholds, VerdictThresholds,
};
use campus_fares_fare_models::{AggregationResult, FareInsight, FareVerdict, InsightLevel};

/// Labels consensus and reliability for an aggregation result.
///
/// Returns `None` when the result has no fares.
#[must_use]
pub fn classify(result: &AggregationResult, config: &InsightConfig) -> Option<FareInsight> {
    if result.is_empty() {
        return None;
    }

    let mean = result.average_fare?;
    let sd = result.standard_deviation?;

    Some(FareInsight {
        consensus: consensus_level(mean, sd, &config.consensus),
        reliability: reliability_level(result.total_fares, &config.reliability),
    })
}

/// `High` when `sd < high_ratio × mean`, `Medium` when
/// `sd < medium_ratio × mean`, `Low` otherwise.
///
/// Zero spread is always `High`, whatever the mean.
#[must_use]
pub fn consensus_level(mean: f64, sd: f64, thresholds: &ConsensusThresholds) -> InsightLevel {
    if sd == 0.0 || sd < thresholds.high_ratio * mean {
        InsightLevel::High
    } else if sd < thresholds.medium_ratio * mean {
        InsightLevel::Medium
    } else {
        InsightLevel::Low
    }
}

/// `High` from `high_count` submissions, `Medium` from `medium_count`.
#[must_use]
pub const fn reliability_level(total: u64, thresholds: &ReliabilityThresholds) -> InsightLevel {
    if total >= thresholds.high_count {
        InsightLevel::High
    } else if total >= thresholds.medium_count {
        InsightLevel::Medium
    } else {
        InsightLevel::Low
    }
}

/// Standard score of `amount` against the result.
///
/// `None` without fares or when every fare is identical.
#[must_use]
pub fn z_score(amount: f64, result: &AggregationResult) -> Option<f64> {
    let mean = result.average_fare?;
    let sd = result.standard_deviation?;
    if sd > 0.0 {
        Some((amount - mean) / sd)
    } else {
        None
    }
}

/// Judges a quoted fare against what others reported.
///
/// With no spread at all, only the exact consensus amount is typical.
/// Returns `None` when there are no fares to compare against.
#[must_use]
pub fn assess_fare(
    amount: f64,
    result: &AggregationResult,
    thresholds: &VerdictThresholds,
) -> Option<FareVerdict> {
    let mean = result.average_fare?;

    let Some(z) = z_score(amount, result) else {
        let tolerance = f64::EPSILON * mean.abs().max(1.0);
        return Some(if (amount - mean).abs() <= tolerance {
            FareVerdict::Typical
        } else if amount < mean {
            FareVerdict::BelowTypical
        } else {
            FareVerdict::AboveTypical
        });
    };

    Some(if z < thresholds.below_z {
        FareVerdict::BelowTypical
    } else if z > thresholds.above_z {
        FareVerdict::AboveTypical
    } else {
        FareVerdict::Typical
    })
}

#[cfg(test)]
mod tests {
    use campus_fares_analytics_models::BucketConfig;

    use super::*;
    use crate::aggregate::aggregate_amounts;

    fn result_of(amounts: &[f64]) -> AggregationResult {
        aggregate_amounts(amounts, &BucketConfig::default())
    }

    #[test]
    fn single_fare_is_low_reliability() {
        let insight = classify(&result_of(&[30.0]), &InsightConfig::default()).unwrap();
        assert_eq!(insight.reliability, InsightLevel::Low);
        assert_eq!(insight.consensus, InsightLevel::High);
    }

    #[test]
    fn tight_cluster_is_high_consensus() {
        let amounts = [38.0, 39.0, 40.0, 40.0, 41.0, 42.0, 40.0, 39.0, 41.0, 40.0];
        let insight = classify(&result_of(&amounts), &InsightConfig::default()).unwrap();
        assert_eq!(insight.consensus, InsightLevel::High);
        assert_eq!(insight.reliability, InsightLevel::High);
    }

    #[test]
    fn wide_spread_is_low_consensus() {
        let amounts = [15.0, 15.0, 20.0, 25.0, 30.0, 70.0, 80.0, 85.0, 90.0, 90.0];
        let insight = classify(&result_of(&amounts), &InsightConfig::default()).unwrap();
        assert_eq!(insight.consensus, InsightLevel::Low);
        assert_eq!(insight.reliability, InsightLevel::High);
    }

    #[test]
    fn moderate_spread_is_medium_consensus() {
        // mean 40, sd 16 => ratio 0.4
        let amounts = [24.0, 56.0];
        let insight = classify(&result_of(&amounts), &InsightConfig::default()).unwrap();
        assert_eq!(insight.consensus, InsightLevel::Medium);
    }

    #[test]
    fn empty_result_has_no_insight() {
        assert!(classify(&AggregationResult::empty(), &InsightConfig::default()).is_none());
    }

    #[test]
    fn reliability_thresholds() {
        let thresholds = ReliabilityThresholds::default();
        assert_eq!(reliability_level(2, &thresholds), InsightLevel::Low);
        assert_eq!(reliability_level(3, &thresholds), InsightLevel::Medium);
        assert_eq!(reliability_level(4, &thresholds), InsightLevel::Medium);
        assert_eq!(reliability_level(5, &thresholds), InsightLevel::High);
    }

    #[test]
    fn axes_are_independent() {
        let few_tight = classify(&result_of(&[40.0, 40.0]), &InsightConfig::default()).unwrap();
        assert_eq!(few_tight.consensus, InsightLevel::High);
        assert_eq!(few_tight.reliability, InsightLevel::Low);
    }

    #[test]
    fn custom_thresholds_change_labels() {
        let config = InsightConfig {
            reliability: ReliabilityThresholds {
                high_count: 2,
                medium_count: 1,
            },
            consensus: ConsensusThresholds {
                high_ratio: 0.01,
                medium_ratio: 0.02,
            },
            ..InsightConfig::default()
        };
        let insight = classify(&result_of(&[38.0, 42.0]), &config).unwrap();
        assert_eq!(insight.reliability, InsightLevel::High);
        assert_eq!(insight.consensus, InsightLevel::Low);
    }

    #[test]
    fn assesses_quotes_against_spread() {
        let result = result_of(&[45.0, 50.0, 42.0, 48.0, 55.0, 38.0]);
        let thresholds = VerdictThresholds::default();

        assert_eq!(
            assess_fare(46.0, &result, &thresholds),
            Some(FareVerdict::Typical)
        );
        assert_eq!(
            assess_fare(80.0, &result, &thresholds),
            Some(FareVerdict::AboveTypical)
        );
        assert_eq!(
            assess_fare(20.0, &result, &thresholds),
            Some(FareVerdict::BelowTypical)
        );
    }

    #[test]
    fn assesses_quotes_without_spread() {
        let result = result_of(&[40.0, 40.0]);
        let thresholds = VerdictThresholds::default();

        assert!(z_score(40.0, &result).is_none());
        assert_eq!(
            assess_fare(40.0, &result, &thresholds),
            Some(FareVerdict::Typical)
        );
        assert_eq!(
            assess_fare(41.0, &result, &thresholds),
            Some(FareVerdict::AboveTypical)
        );
        assert_eq!(
            assess_fare(39.0, &result, &thresholds),
            Some(FareVerdict::BelowTypical)
        );
    }

    #[test]
    fn no_verdict_without_data() {
        assert!(
            assess_fare(40.0, &AggregationResult::empty(), &VerdictThresholds::default())
                .is_none()
        );
    }

    #[test]
    fn zero_spread_is_high_consensus_for_any_mean() {
        let thresholds = ConsensusThresholds::default();
        for mean in [0.0, -5.0, 40.0] {
            assert_eq!(consensus_level(mean, 0.0, &thresholds), InsightLevel::High);
        }
        assert_eq!(consensus_level(0.0, 1.0, &thresholds), InsightLevel::Low);
    }

    #[test]
    fn sub_unit_fares_keep_their_consensus() {
        let insight = classify(&result_of(&[0.3, 0.2]), &InsightConfig::default()).unwrap();
        // mean 0.25, sd 0.05
        assert_eq!(insight.consensus, InsightLevel::High);
        assert_eq!(insight.reliability, InsightLevel::Low);
    }
}
