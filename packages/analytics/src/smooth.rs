//! Gaussian kernel smoothing of fare histograms.
//!
//! A place with a handful of distinct fares renders as a few isolated bars.
//! [`smooth`] resamples the histogram at evenly spaced amounts and replaces
//! each sample with a kernel-weighted average of the bucket counts, which
//! gives every place a comparable bell-like shape. The output is for
//! display only and is never used to compute statistics.

use campus_fares_analytics_models::{BucketConfig, SmoothingConfig};
use campus_fares_fare_models::{AggregationResult, CurvePoint, HistogramBucket, SmoothedCurve};

/// Smooths `distribution` over `[min_fare, max_fare]`.
///
/// * An empty distribution yields an empty curve.
/// * When `min_fare == max_fare` the curve is a single real point carrying
///   that bucket's count.
/// * Otherwise the curve has `smoothing.sample_count` points (at least two),
///   the first at `min_fare` and the last at `max_fare`.
///
/// A sample is marked as real (`is_interpolated == false`) only when it lies
/// within half a bucket width of an actual bucket amount.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn smooth(
    distribution: &[HistogramBucket],
    min_fare: f64,
    max_fare: f64,
    smoothing: &SmoothingConfig,
    bucket: &BucketConfig,
) -> SmoothedCurve {
    if distribution.is_empty() {
        return SmoothedCurve::default();
    }

    let (low, high) = if min_fare <= max_fare {
        (min_fare, max_fare)
    } else {
        (max_fare, min_fare)
    };

    if high.total_cmp(&low).is_eq() {
        return SmoothedCurve {
            points: vec![CurvePoint {
                amount: low,
                weight: nearest_count(distribution, low) as f64,
                is_interpolated: false,
            }],
        };
    }

    let samples = smoothing.sample_count.max(2);
    let step = (high - low) / (samples - 1) as f64;
    let tolerance = bucket.granularity.max(0.0) / 2.0;

    let points = (0..samples)
        .map(|i| {
            let amount = if i == samples - 1 {
                high
            } else {
                (i as f64).mul_add(step, low)
            };

            CurvePoint {
                amount,
                weight: kernel_weight(distribution, amount, smoothing.bandwidth),
                is_interpolated: !distribution
                    .iter()
                    .any(|b| (amount - b.amount).abs() <= tolerance),
            }
        })
        .collect();

    SmoothedCurve { points }
}

/// Smooths the distribution held in an aggregation result.
///
/// Returns an empty curve for an empty result.
#[must_use]
pub fn smooth_result(
    result: &AggregationResult,
    smoothing: &SmoothingConfig,
    bucket: &BucketConfig,
) -> SmoothedCurve {
    match (result.min_fare, result.max_fare) {
        (Some(min), Some(max)) => smooth(&result.distribution, min, max, smoothing, bucket),
        _ => SmoothedCurve::default(),
    }
}

/// Nadaraya–Watson estimate of the bucket count at `x`.
///
/// Falls back to the nearest bucket's count when every kernel term
/// underflows to zero or the bandwidth is not positive.
#[allow(clippy::cast_precision_loss)]
fn kernel_weight(distribution: &[HistogramBucket], x: f64, bandwidth: f64) -> f64 {
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return nearest_count(distribution, x) as f64;
    }

    let two_sigma_sq = 2.0 * bandwidth * bandwidth;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for b in distribution {
        let k = (-(x - b.amount).powi(2) / two_sigma_sq).exp();
        numerator += b.count as f64 * k;
        denominator += k;
    }

    if denominator > 0.0 {
        numerator / denominator
    } else {
        nearest_count(distribution, x) as f64
    }
}

fn nearest_count(distribution: &[HistogramBucket], x: f64) -> u64 {
    distribution
        .iter()
        .min_by(|a, b| (a.amount - x).abs().total_cmp(&(b.amount - x).abs()))
        .map_or(0, |b| b.count)
}

#[cfg(test)]
mod tests {
    use campus_fares_fare_models::NewFareRecord;
    use campus_fares_store::{FareStore, memory::MemoryFareStore};

    use super::*;
    use crate::aggregate::aggregate;

    fn buckets(pairs: &[(f64, u64)]) -> Vec<HistogramBucket> {
        pairs
            .iter()
            .map(|&(amount, count)| HistogramBucket { amount, count })
            .collect()
    }

    #[test]
    fn produces_configured_sample_count() {
        let dist = buckets(&[(38.0, 1), (45.0, 2), (55.0, 1)]);
        for sample_count in [20, 50, 100] {
            let config = SmoothingConfig {
                sample_count,
                bandwidth: 5.0,
            };
            let curve = smooth(&dist, 38.0, 55.0, &config, &BucketConfig::default());
            assert_eq!(curve.len(), sample_count);
        }
    }

    #[test]
    fn spans_min_to_max_in_order() {
        let dist = buckets(&[(38.0, 1), (55.0, 1)]);
        let curve = smooth(
            &dist,
            38.0,
            55.0,
            &SmoothingConfig::default(),
            &BucketConfig::default(),
        );

        assert!((curve.points[0].amount - 38.0).abs() < f64::EPSILON);
        assert!((curve.points[curve.len() - 1].amount - 55.0).abs() < f64::EPSILON);
        assert!(
            curve
                .points
                .windows(2)
                .all(|w| w[0].amount < w[1].amount)
        );
    }

    #[test]
    fn single_amount_degenerates_to_one_point() {
        let dist = buckets(&[(30.0, 4)]);
        let curve = smooth(
            &dist,
            30.0,
            30.0,
            &SmoothingConfig::default(),
            &BucketConfig::default(),
        );

        assert_eq!(curve.len(), 1);
        assert!((curve.points[0].weight - 4.0).abs() < f64::EPSILON);
        assert!(!curve.points[0].is_interpolated);
    }

    #[test]
    fn narrow_ranges_still_resample() {
        let dist = buckets(&[(0.0, 2)]);
        let curve = smooth(
            &dist,
            1e-200,
            2e-200,
            &SmoothingConfig::default(),
            &BucketConfig::default(),
        );
        assert_eq!(curve.len(), SmoothingConfig::default().sample_count);
        assert!(curve.points.iter().all(|p| (p.weight - 2.0).abs() < 1e-9));
    }

    #[test]
    fn empty_distribution_yields_empty_curve() {
        let curve = smooth(
            &[],
            0.0,
            10.0,
            &SmoothingConfig::default(),
            &BucketConfig::default(),
        );
        assert!(curve.is_empty());
    }

    #[test]
    fn marks_points_near_buckets_as_real() {
        let dist = buckets(&[(0.0, 1), (100.0, 1)]);
        let config = SmoothingConfig {
            sample_count: 21,
            bandwidth: 5.0,
        };
        let curve = smooth(&dist, 0.0, 100.0, &config, &BucketConfig::default());

        assert!(!curve.points[0].is_interpolated);
        assert!(!curve.points[20].is_interpolated);
        assert!(curve.points[1..20].iter().all(|p| p.is_interpolated));
    }

    #[test]
    fn weights_stay_within_bucket_count_range() {
        let dist = buckets(&[(40.0, 1), (42.0, 6), (50.0, 2)]);
        let curve = smooth(
            &dist,
            40.0,
            50.0,
            &SmoothingConfig::default(),
            &BucketConfig::default(),
        );

        assert!(curve.points.iter().all(|p| p.weight >= 1.0 && p.weight <= 6.0));
        let peak = curve.peak().unwrap();
        assert!(peak.amount < 46.0);
    }

    #[test]
    fn far_samples_fall_back_to_nearest_bucket() {
        let dist = buckets(&[(0.0, 3), (10_000.0, 7)]);
        let config = SmoothingConfig {
            sample_count: 20,
            bandwidth: 1.0,
        };
        let curve = smooth(&dist, 0.0, 10_000.0, &config, &BucketConfig::default());

        assert!((curve.points[0].weight - 3.0).abs() < 1e-9);
        assert!((curve.points[19].weight - 7.0).abs() < 1e-9);
        assert!(curve.points.iter().all(|p| p.weight.is_finite()));
    }

    #[test]
    fn smoothing_does_not_change_aggregation() {
        let store = MemoryFareStore::new();
        for amount in [45.0, 50.0, 42.0, 48.0, 55.0, 38.0] {
            store.append(NewFareRecord::new("sangam", amount)).unwrap();
        }
        let buckets = BucketConfig::default();
        let before = aggregate(&store, "sangam", &buckets).unwrap();

        for (sample_count, bandwidth) in [(20, 0.5), (50, 5.0), (100, 50.0)] {
            let config = SmoothingConfig {
                sample_count,
                bandwidth,
            };
            let curve = smooth_result(&before, &config, &buckets);
            assert_eq!(curve.len(), sample_count);
            assert_eq!(aggregate(&store, "sangam", &buckets).unwrap(), before);
        }
    }
}
