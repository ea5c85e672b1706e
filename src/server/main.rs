//! PID service.
//!
//! Exposes PID encoding, validation and hierarchy comparison together
//! with geo-verification and waybill building over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use placeid::geo::VerifyOptions;
use placeid::models::WaybillPayload;
use placeid::pid::{PidError, PidValidation};
use placeid::{Config, ValidationCache};

mod api;
use api::{
    execute_compare, execute_encode, execute_nearest, execute_verify, execute_waybill,
    CompareParams, CompareResponse, EncodeRequest, EncodeResponse, NearestRequest,
    NearestResponse, ValidateParams, VerifyRequest, VerifyResponse, WaybillRequest,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "pid-server")]
#[command(about = "Address PID and geo-verification server")]
struct Args {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    cache: ValidationCache,
    options: VerifyOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Placeid Server");
    info!(
        "Verification tolerance {} m, min confidence {}",
        config.verification.tolerance_meters, config.verification.min_confidence
    );

    let state = Arc::new(AppState {
        cache: ValidationCache::bounded(config.server.cache_capacity),
        options: config.verification,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/pid/encode", post(encode_handler))
        .route("/v1/pid/validate", get(validate_handler))
        .route("/v1/pid/compare", get(compare_handler))
        .route("/v1/geo/verify", post(verify_handler))
        .route("/v1/geo/nearest", post(nearest_handler))
        .route("/v1/waybill", post(waybill_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.server.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn bad_request(e: PidError) -> (StatusCode, String) {
    tracing::warn!("Rejected request: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cached_validations: state.cache.len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cached_validations: usize,
}

/// Encode a normalized address into a PID
async fn encode_handler(
    Json(request): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, (StatusCode, String)> {
    execute_encode(request).map(Json).map_err(bad_request)
}

/// Structural validation; always answers 200 with the issue list
async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
) -> Json<PidValidation> {
    Json(state.cache.validate(&params.pid))
}

/// Hierarchy relation between two PIDs
async fn compare_handler(Query(params): Query<CompareParams>) -> Json<CompareResponse> {
    Json(execute_compare(&params))
}

/// Check an observed point against a claimed address
async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    Json(execute_verify(request, &state.options, &state.cache))
}

/// Best matching candidate for an observed point
async fn nearest_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NearestRequest>,
) -> Result<Json<NearestResponse>, (StatusCode, String)> {
    // Large candidate lists build an R-tree; keep that off the runtime threads
    let options = state.options;
    let response = tokio::task::spawn_blocking(move || execute_nearest(request, &options))
        .await
        .map_err(|e| {
            tracing::error!("Nearest search failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(response))
}

/// Build a waybill payload for a PID
async fn waybill_handler(
    Json(request): Json<WaybillRequest>,
) -> Result<Json<WaybillPayload>, (StatusCode, String)> {
    execute_waybill(request).map(Json).map_err(bad_request)
}
