//! Fare aggregation: bucketing and summary statistics.
//!
//! Buckets feed the histogram and the mode. Mean, median, min, max and
//! standard deviation are taken from the recorded amounts themselves.

use campus_fares_analytics_models::BucketConfig;
use campus_fares_fare_models::{AggregationResult, FareRecord, HistogramBucket};
use campus_fares_store::FareStore;

use crate::AnalyticsError;

/// Rounds `amount` to the nearest multiple of `granularity`.
///
/// A non-positive granularity leaves the amount untouched.
#[must_use]
pub fn round_to_granularity(amount: f64, granularity: f64) -> f64 {
    if granularity > 0.0 {
        (amount / granularity).round() * granularity
    } else {
        amount
    }
}

/// Tallies amounts into buckets sorted ascending by amount.
#[must_use]
pub fn bucket_amounts(
    amounts: impl IntoIterator<Item = f64>,
    config: &BucketConfig,
) -> Vec<HistogramBucket> {
    let mut rounded: Vec<f64> = amounts
        .into_iter()
        .map(|amount| round_to_granularity(amount, config.granularity))
        .collect();
    rounded.sort_by(f64::total_cmp);

    let mut buckets: Vec<HistogramBucket> = Vec::new();
    for amount in rounded {
        match buckets.last_mut() {
            Some(last) if last.amount.total_cmp(&amount).is_eq() => last.count += 1,
            _ => buckets.push(HistogramBucket { amount, count: 1 }),
        }
    }
    buckets
}

/// Aggregates an explicit list of records.
///
/// This is the storage-free core of [`aggregate`].
#[must_use]
pub fn aggregate_records(records: &[FareRecord], config: &BucketConfig) -> AggregationResult {
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
    aggregate_amounts(&amounts, config)
}

/// Aggregates bare amounts in any order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_amounts(amounts: &[f64], config: &BucketConfig) -> AggregationResult {
    let mut sorted = amounts.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return AggregationResult::empty();
    };

    let distribution = bucket_amounts(sorted.iter().copied(), config);

    let total = sorted.len();
    let (mean, standard_deviation) = if min.total_cmp(&max).is_eq() {
        (min, 0.0)
    } else {
        let mean = mean_of(&sorted);
        (mean.clamp(min, max), population_sd(&sorted, mean))
    };

    let median = if total % 2 == 1 {
        sorted[total / 2]
    } else {
        midpoint(sorted[total / 2 - 1], sorted[total / 2])
    };

    // Strictly greater keeps the lowest amount on ties.
    let mut mode: Option<&HistogramBucket> = None;
    for bucket in &distribution {
        if mode.is_none_or(|m| bucket.count > m.count) {
            mode = Some(bucket);
        }
    }

    AggregationResult {
        total_fares: total as u64,
        average_fare: Some(mean),
        min_fare: Some(min),
        max_fare: Some(max),
        median_fare: Some(median),
        mode_fare: mode.map(|b| b.amount),
        standard_deviation: Some(standard_deviation),
        distribution,
    }
}

/// Aggregates every fare stored for `place_key`.
///
/// Reads the store once and never writes to it. A place with no records
/// yields [`AggregationResult::empty`].
///
/// # Errors
///
/// Returns [`AnalyticsError::Store`] if the store read fails.
pub fn aggregate(
    store: &dyn FareStore,
    place_key: &str,
    config: &BucketConfig,
) -> Result<AggregationResult, AnalyticsError> {
    let records = store.list_by_place(place_key)?;
    log::debug!(
        "Aggregating {} fare(s) for place '{place_key}'",
        records.len()
    );
    Ok(aggregate_records(&records, config))
}

/// Mean that stays finite when the plain sum would overflow.
#[allow(clippy::cast_precision_loss)]
fn mean_of(amounts: &[f64]) -> f64 {
    let n = amounts.len() as f64;
    let mean = amounts.iter().sum::<f64>() / n;
    if mean.is_finite() {
        mean
    } else {
        amounts.iter().map(|a| a / n).sum()
    }
}

fn midpoint(a: f64, b: f64) -> f64 {
    a / 2.0 + b / 2.0
}

/// Population standard deviation around `mean`.
///
/// Deviations are scaled by the largest one first, so distinct amounts
/// never square down to zero or up to infinity.
#[allow(clippy::cast_precision_loss)]
fn population_sd(amounts: &[f64], mean: f64) -> f64 {
    let scale = amounts
        .iter()
        .map(|a| (a - mean).abs())
        .fold(0.0_f64, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let variance = amounts
        .iter()
        .map(|a| ((a - mean) / scale).powi(2))
        .sum::<f64>()
        / amounts.len() as f64;
    scale * variance.sqrt()
}
