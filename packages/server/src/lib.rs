#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for campus fare submissions.
//!
//! Accepts fare submissions and serves per-place statistics, smoothed
//! distributions and fare verdicts as JSON. Each request is routed to the
//! fare partition named by the `X-Fare-Identity` header, falling back to
//! the shared `anonymous` partition.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use campus_fares_analytics::config::load_config_from_env;
use campus_fares_analytics_models::AnalyticsConfig;
use campus_fares_server_models::ApiError;
use campus_fares_store::partitions::{FarePartitions, StoreBackend};

/// Environment variable selecting the storage backend (`duckdb` or
/// `memory`).
pub const STORE_BACKEND_ENV: &str = "CAMPUS_FARES_STORE";

/// Shared application state.
pub struct AppState {
    /// Fare stores, one per identity.
    pub partitions: FarePartitions,
    /// Aggregation, smoothing and insight knobs.
    pub config: AnalyticsConfig,
}

impl AppState {
    /// Creates state with no partitions opened yet.
    #[must_use]
    pub fn new(backend: StoreBackend, config: AnalyticsConfig) -> Self {
        Self {
            partitions: FarePartitions::new(backend),
            config,
        }
    }
}

/// Everything needed to start the server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Storage backend for fare partitions.
    pub backend: StoreBackend,
    /// Analytics configuration.
    pub config: AnalyticsConfig,
}

impl ServerOptions {
    /// Reads `BIND_ADDR`, `PORT`, `CAMPUS_FARES_STORE` and
    /// `CAMPUS_FARES_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the storage backend name is
    /// unknown or the analytics config file is invalid.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let backend_name = std::env::var(STORE_BACKEND_ENV).unwrap_or_default();
        let backend = StoreBackend::from_name(&backend_name).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Unknown {STORE_BACKEND_ENV} value '{backend_name}'"),
            )
        })?;

        let config = load_config_from_env()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            bind_addr,
            port,
            backend,
            config,
        })
    }
}

/// Registers the `/api` routes plus JSON error bodies for malformed
/// requests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        error::InternalError::from_response(err, response).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config).app_data(query_config).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/fares", web::post().to(handlers::submit_fare))
            .route("/fares", web::delete().to(handlers::clear_fares))
            .route("/places", web::get().to(handlers::places))
            .route("/places/{place_key}/fares", web::get().to(handlers::place_fares))
            .route(
                "/places/{place_key}/summary",
                web::get().to(handlers::place_summary),
            )
            .route(
                "/places/{place_key}/verdict",
                web::get().to(handlers::place_verdict),
            ),
    );
}

/// Starts the API server with options read from the environment.
///
/// The caller is responsible for initialising logging and providing the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the options are invalid, or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    run_server_with(ServerOptions::from_env()?).await
}

/// Starts the API server with explicit options.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server_with(options: ServerOptions) -> std::io::Result<()> {
    let ServerOptions {
        bind_addr,
        port,
        backend,
        config,
    } = options;

    match &backend {
        StoreBackend::Memory => log::info!("Using in-memory fare storage"),
        StoreBackend::DuckDb { data_dir } => {
            log::info!("Using DuckDB fare storage under {}", data_dir.display());
        }
    }

    let state = web::Data::new(AppState::new(backend, config));

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
