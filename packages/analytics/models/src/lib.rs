#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fare analytics configuration and report types.
//!
//! Every tunable used by the aggregator, smoother and classifier lives in
//! [`AnalyticsConfig`] so nothing is hardcoded out of sight. All fields have
//! defaults, which means an empty TOML document is a valid configuration:
//!
//! ```toml
//! [bucket]
//! granularity = 1.0
//!
//! [smoothing]
//! sample_count = 50
//! bandwidth = 5.0
//!
//! [insight.consensus]
//! high_ratio = 0.3
//! medium_ratio = 0.5
//!
//! [insight.reliability]
//! high_count = 5
//! medium_count = 3
//!
//! [insight.verdict]
//! below_z = -1.0
//! above_z = 1.0
//! ```

use campus_fares_fare_models::{AggregationResult, FareInsight, FareVerdict, SmoothedCurve};
use serde::{Deserialize, Serialize};

/// Full analytics configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Histogram bucketing.
    pub bucket: BucketConfig,
    /// Curve smoothing.
    pub smoothing: SmoothingConfig,
    /// Classifier thresholds.
    pub insight: InsightConfig,
}

/// How fares are rounded into histogram buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketConfig {
    /// Bucket width. Amounts are rounded to the nearest multiple.
    pub granularity: f64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self { granularity: 1.0 }
    }
}

/// Gaussian kernel smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Number of evenly spaced samples across `[min, max]`.
    pub sample_count: usize,
    /// Kernel bandwidth (σ) in amount units.
    pub bandwidth: f64,
}

impl SmoothingConfig {
    /// Smallest accepted sample count.
    pub const MIN_SAMPLES: usize = 20;
    /// Largest accepted sample count.
    pub const MAX_SAMPLES: usize = 100;
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            sample_count: 50,
            bandwidth: 5.0,
        }
    }
}

/// Threshold pairs used by the insight classifier and fare verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightConfig {
    /// Spread thresholds for the consensus label.
    pub consensus: ConsensusThresholds,
    /// Sample-size thresholds for the reliability label.
    pub reliability: ReliabilityThresholds,
    /// Z-score band for judging a single quoted fare.
    pub verdict: VerdictThresholds,
}

/// Consensus is `High` when `sd < high_ratio × mean` and `Medium` when
/// `sd < medium_ratio × mean`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsensusThresholds {
    /// Upper bound (exclusive) of `sd / mean` for `High`.
    pub high_ratio: f64,
    /// Upper bound (exclusive) of `sd / mean` for `Medium`.
    pub medium_ratio: f64,
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            high_ratio: 0.3,
            medium_ratio: 0.5,
        }
    }
}

/// Reliability is `High` at `high_count` submissions and `Medium` at
/// `medium_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReliabilityThresholds {
    /// Minimum submissions for `High`.
    pub high_count: u64,
    /// Minimum submissions for `Medium`.
    pub medium_count: u64,
}

impl Default for ReliabilityThresholds {
    fn default() -> Self {
        Self {
            high_count: 5,
            medium_count: 3,
        }
    }
}

/// A quoted fare is typical when its z-score lies within
/// `[below_z, above_z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerdictThresholds {
    /// Z-scores below this are `BELOW_TYPICAL`.
    pub below_z: f64,
    /// Z-scores above this are `ABOVE_TYPICAL`.
    pub above_z: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            below_z: -1.0,
            above_z: 1.0,
        }
    }
}

/// Everything a chart needs for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFareSummary {
    /// Place the summary describes.
    pub place_key: String,
    /// Exact statistics over the bucketed fares.
    pub statistics: AggregationResult,
    /// Display-only smoothed distribution.
    pub curve: SmoothedCurve,
    /// Qualitative labels, absent when there are no fares.
    pub insight: Option<FareInsight>,
}

/// Judgment of a single quoted fare against a place's submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareAssessment {
    /// Place the fare was quoted for.
    pub place_key: String,
    /// Quoted fare.
    pub amount: f64,
    /// Number of submissions compared against.
    pub total_fares: u64,
    /// Mean of the submissions, if any.
    pub average_fare: Option<f64>,
    /// Standard score of the quote, absent without data or spread.
    pub z_score: Option<f64>,
    /// Verdict, absent without data.
    pub verdict: Option<FareVerdict>,
}
