//! End-to-end fare summaries for one place, and the "places with data"
//! listing.

use campus_fares_analytics_models::{AnalyticsConfig, FareAssessment, PlaceFareSummary};
use campus_fares_fare_models::{FareRecord, PlaceActivity};
use campus_fares_store::FareStore;

use crate::AnalyticsError;
use crate::aggregate::aggregate_records;
use crate::insight::{assess_fare, classify, z_score};
use crate::smooth::smooth_result;

/// Runs aggregate, smooth and classify over an explicit record list.
#[must_use]
pub fn summarize_records(
    place_key: &str,
    records: &[FareRecord],
    config: &AnalyticsConfig,
) -> PlaceFareSummary {
    let statistics = aggregate_records(records, &config.bucket);
    let curve = smooth_result(&statistics, &config.smoothing, &config.bucket);
    let insight = classify(&statistics, &config.insight);

    PlaceFareSummary {
        place_key: place_key.to_string(),
        statistics,
        curve,
        insight,
    }
}

/// Summarizes every fare stored for `place_key`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Store`] if the store read fails.
pub fn summarize(
    store: &dyn FareStore,
    place_key: &str,
    config: &AnalyticsConfig,
) -> Result<PlaceFareSummary, AnalyticsError> {
    let records = store.list_by_place(place_key)?;
    let summary = summarize_records(place_key, &records, config);

    log::debug!(
        "Summarized place '{place_key}': {} fare(s), {} curve point(s)",
        summary.statistics.total_fares,
        summary.curve.len()
    );

    Ok(summary)
}

/// Judges a quoted `amount` for `place_key` against the stored fares.
///
/// # Errors
///
/// Returns [`AnalyticsError::Store`] if the store read fails.
pub fn assess(
    store: &dyn FareStore,
    place_key: &str,
    amount: f64,
    config: &AnalyticsConfig,
) -> Result<FareAssessment, AnalyticsError> {
    let statistics = aggregate_records(&store.list_by_place(place_key)?, &config.bucket);

    Ok(FareAssessment {
        place_key: place_key.to_string(),
        amount,
        total_fares: statistics.total_fares,
        average_fare: statistics.average_fare,
        z_score: z_score(amount, &statistics),
        verdict: assess_fare(amount, &statistics, &config.insight.verdict),
    })
}

/// Lists places with at least one fare, busiest first, ties by key.
///
/// # Errors
///
/// Returns [`AnalyticsError::Store`] if the store read fails.
pub fn places_with_data(store: &dyn FareStore) -> Result<Vec<PlaceActivity>, AnalyticsError> {
    let mut places = store.list_places()?;
    places.sort_by(|a, b| {
        b.fare_count
            .cmp(&a.fare_count)
            .then_with(|| a.place_key.cmp(&b.place_key))
    });
    Ok(places)
}
