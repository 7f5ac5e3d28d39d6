//! HTTP handler functions for the campus fares API.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use campus_fares_analytics::AnalyticsError;
use campus_fares_analytics::summary::{assess, places_with_data, summarize};
use campus_fares_fare_models::NewFareRecord;
use campus_fares_server_models::{
    ApiError, ApiHealth, IDENTITY_HEADER, SubmitFareRequest, VerdictQueryParams,
};
use campus_fares_store::{FareStore, StoreError};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/fares`
///
/// Stores a submission in the caller's partition and echoes the record.
pub async fn submit_fare(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SubmitFareRequest>,
) -> HttpResponse {
    let identity = identity(&req);
    let input = NewFareRecord::from(body.into_inner());

    match with_store(state, identity, "submit fare", move |store, _| {
        Ok(store.append(input)?)
    })
    .await
    {
        Ok(record) => {
            log::debug!(
                "Stored fare {} for '{}': {}",
                record.id,
                record.place_key,
                record.amount
            );
            HttpResponse::Created().json(record)
        }
        Err(response) => response,
    }
}

/// `DELETE /api/fares`
///
/// Removes every record in the caller's partition.
pub async fn clear_fares(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let identity = identity(&req);

    match with_store(state, identity, "clear fares", |store, _| Ok(store.clear()?)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(response) => response,
    }
}

/// `GET /api/places`
///
/// Lists places with at least one fare, busiest first.
pub async fn places(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let identity = identity(&req);

    match with_store(state, identity, "list places", |store, _| {
        places_with_data(store.as_ref())
    })
    .await
    {
        Ok(places) => HttpResponse::Ok().json(places),
        Err(response) => response,
    }
}

/// `GET /api/places/{place_key}/fares`
///
/// Returns the raw records for one place in submission order.
pub async fn place_fares(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let identity = identity(&req);
    let place_key = path.into_inner();

    match with_store(state, identity, "list fares", move |store, _| {
        Ok(store.list_by_place(&place_key)?)
    })
    .await
    {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(response) => response,
    }
}

/// `GET /api/places/{place_key}/summary`
///
/// Statistics, smoothed curve and insight labels for one place.
pub async fn place_summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let identity = identity(&req);
    let place_key = path.into_inner();

    match with_store(state, identity, "summarize place", move |store, state| {
        summarize(store.as_ref(), &place_key, &state.config)
    })
    .await
    {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(response) => response,
    }
}

/// `GET /api/places/{place_key}/verdict?amount=`
///
/// Judges a quoted fare against the place's submissions.
pub async fn place_verdict(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    params: web::Query<VerdictQueryParams>,
) -> HttpResponse {
    let amount = params.amount;
    if !amount.is_finite() || amount <= 0.0 {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "amount must be a positive number, got {amount}"
        )));
    }

    let identity = identity(&req);
    let place_key = path.into_inner();

    match with_store(state, identity, "assess fare", move |store, state| {
        assess(store.as_ref(), &place_key, amount, &state.config)
    })
    .await
    {
        Ok(assessment) => HttpResponse::Ok().json(assessment),
        Err(response) => response,
    }
}

fn identity(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Opens the caller's partition and runs `f` on the blocking thread pool.
///
/// Store reads and writes may touch disk, so they never run on the async
/// workers.
async fn with_store<T, F>(
    state: web::Data<AppState>,
    identity: Option<String>,
    action: &'static str,
    f: F,
) -> Result<T, HttpResponse>
where
    T: Send + 'static,
    F: FnOnce(Arc<dyn FareStore>, &AppState) -> Result<T, AnalyticsError> + Send + 'static,
{
    let result = web::block(move || {
        let store = state.partitions.store_for(identity.as_deref())?;
        f(store, &state)
    })
    .await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(error_response(action, &e)),
        Err(e) => {
            log::error!("Failed to {action}: {e}");
            Err(HttpResponse::InternalServerError()
                .json(ApiError::new(format!("Failed to {action}"))))
        }
    }
}

fn error_response(action: &str, e: &AnalyticsError) -> HttpResponse {
    match e {
        AnalyticsError::Store(StoreError::InvalidRecord(invalid)) => {
            HttpResponse::BadRequest().json(ApiError::new(invalid))
        }
        AnalyticsError::Store(StoreError::StorageUnavailable { .. }) => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::ServiceUnavailable().json(ApiError::new(format!(
                "Failed to {action}: storage unavailable"
            )))
        }
        AnalyticsError::Config { .. } => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(format!("Failed to {action}")))
        }
    }
}
