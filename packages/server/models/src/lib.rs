#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the campus fares server.
//!
//! Summary and record responses reuse the domain types directly; only
//! the request shapes and envelope types live here.

use campus_fares_fare_models::NewFareRecord;
use serde::{Deserialize, Serialize};

/// Header carrying the caller's identity. Selects the fare partition.
pub const IDENTITY_HEADER: &str = "X-Fare-Identity";

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Body of `POST /api/fares`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFareRequest {
    /// Destination the fare was paid for.
    pub place_key: String,
    /// Amount paid.
    pub amount: f64,
    /// Optional submitter identity; blank means anonymous.
    #[serde(default)]
    pub submitter_id: Option<String>,
}

impl From<SubmitFareRequest> for NewFareRecord {
    fn from(req: SubmitFareRequest) -> Self {
        let input = Self::new(req.place_key, req.amount);
        match req.submitter_id {
            Some(submitter) => input.with_submitter(submitter),
            None => input,
        }
    }
}

/// Query parameters for `GET /api/places/{placeKey}/verdict`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictQueryParams {
    /// Quoted fare to judge.
    pub amount: f64,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
