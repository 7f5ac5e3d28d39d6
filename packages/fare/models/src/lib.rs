#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Fare record and fare distribution types.
//!
//! A [`FareRecord`] is one person's reported cost of reaching one place.
//! Everything else in this crate is derived from a set of records: the
//! bucketed [`HistogramBucket`] distribution, the [`AggregationResult`]
//! statistics, the display-only [`SmoothedCurve`], and the qualitative
//! [`FareInsight`] labels.
//!
//! Place keys are opaque. They come from an external place resolver and
//! are never parsed here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Submitter identity used when a submission carries none.
pub const ANONYMOUS_SUBMITTER: &str = "anonymous";

/// A fare submission before it has been accepted by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFareRecord {
    /// Opaque destination identifier.
    pub place_key: String,
    /// Reported fare, currency-agnostic.
    pub amount: f64,
    /// Identity of the submitter. `None` is stored as [`ANONYMOUS_SUBMITTER`].
    pub submitter_id: Option<String>,
}

impl NewFareRecord {
    /// Creates an anonymous submission.
    #[must_use]
    pub fn new(place_key: impl Into<String>, amount: f64) -> Self {
        Self {
            place_key: place_key.into(),
            amount,
            submitter_id: None,
        }
    }

    /// Attributes the submission to `submitter_id`.
    #[must_use]
    pub fn with_submitter(mut self, submitter_id: impl Into<String>) -> Self {
        self.submitter_id = Some(submitter_id.into());
        self
    }

    /// Returns the submitter, falling back to [`ANONYMOUS_SUBMITTER`] when
    /// unset or blank.
    #[must_use]
    pub fn submitter_id(&self) -> &str {
        self.submitter_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_SUBMITTER)
    }

    /// Checks that the submission can be stored.
    ///
    /// Only structural problems are rejected: a blank place key or an
    /// amount that is not a positive finite number. There is no upper
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidFareRecord`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InvalidFareRecord> {
        if self.place_key.trim().is_empty() {
            return Err(InvalidFareRecord::EmptyPlaceKey);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(InvalidFareRecord::NonPositiveAmount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

/// Reason a [`NewFareRecord`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidFareRecord {
    /// The place key was empty or whitespace.
    EmptyPlaceKey,
    /// The amount was zero, negative, NaN or infinite.
    NonPositiveAmount {
        /// The rejected amount.
        amount: f64,
    },
}

impl std::fmt::Display for InvalidFareRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlaceKey => write!(f, "place key must not be empty"),
            Self::NonPositiveAmount { amount } => {
                write!(f, "fare amount must be a positive number, got {amount}")
            }
        }
    }
}

impl std::error::Error for InvalidFareRecord {}

/// A stored fare submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareRecord {
    /// Unique record identifier, never reused.
    pub id: String,
    /// Opaque destination identifier.
    pub place_key: String,
    /// Reported fare.
    pub amount: f64,
    /// Submitter identity (may be [`ANONYMOUS_SUBMITTER`]).
    pub submitter_id: String,
    /// When the store accepted the submission.
    pub submitted_at: DateTime<Utc>,
}

/// A place that has at least one fare submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceActivity {
    /// Opaque destination identifier.
    pub place_key: String,
    /// Number of submissions for the place.
    pub fare_count: u64,
    /// Most recent submission time.
    pub last_submitted_at: DateTime<Utc>,
}

/// Number of fares that rounded to the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    /// Rounded amount.
    pub amount: f64,
    /// Number of fares in this bucket.
    pub count: u64,
}

/// Summary statistics for all fares submitted for one place.
///
/// When `total_fares` is zero every statistic is `None`. Callers should
/// branch on [`Self::is_empty`] before reading anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Buckets sorted ascending by amount.
    pub distribution: Vec<HistogramBucket>,
    /// Number of fares aggregated.
    pub total_fares: u64,
    /// Arithmetic mean.
    pub average_fare: Option<f64>,
    /// Smallest bucketed amount.
    pub min_fare: Option<f64>,
    /// Largest bucketed amount.
    pub max_fare: Option<f64>,
    /// Middle value (mean of the two middle values for even counts).
    pub median_fare: Option<f64>,
    /// Most frequent bucket amount, lowest amount on ties.
    pub mode_fare: Option<f64>,
    /// Population standard deviation.
    pub standard_deviation: Option<f64>,
}

impl AggregationResult {
    /// A result for a place with no fares.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            distribution: Vec::new(),
            total_fares: 0,
            average_fare: None,
            min_fare: None,
            max_fare: None,
            median_fare: None,
            mode_fare: None,
            standard_deviation: None,
        }
    }

    /// Returns `true` when no fares were aggregated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_fares == 0
    }
}

/// One sample of a smoothed distribution curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    /// Amount on the x-axis.
    pub amount: f64,
    /// Kernel-weighted count at this amount.
    pub weight: f64,
    /// `false` only when the sample sits on a real bucket.
    pub is_interpolated: bool,
}

/// Display-only smoothed rendering of a fare histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmoothedCurve {
    /// Samples in ascending amount order.
    pub points: Vec<CurvePoint>,
}

impl SmoothedCurve {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the curve has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The sample with the largest weight, if any.
    #[must_use]
    pub fn peak(&self) -> Option<&CurvePoint> {
        self.points
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }
}

/// Three-step qualitative level used by both insight axes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum InsightLevel {
    /// Weakest level.
    Low,
    /// Middle level.
    Medium,
    /// Strongest level.
    High,
}

/// Qualitative labels for a place's fares.
///
/// The two axes are independent: many submissions with a wide spread is
/// high reliability but low consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareInsight {
    /// How tightly fares cluster relative to their mean.
    pub consensus: InsightLevel,
    /// Whether there are enough submissions to trust the numbers.
    pub reliability: InsightLevel,
}

/// Where a quoted fare falls relative to what others reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FareVerdict {
    /// Cheaper than most reported fares.
    BelowTypical,
    /// Within the usual range.
    Typical,
    /// More expensive than most reported fares.
    AboveTypical,
}
