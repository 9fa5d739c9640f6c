//! REST routes of the control panel.
//!
//! | Method | Path                               | Handler            |
//! |--------|------------------------------------|--------------------|
//! | GET    | `/api/config`                      | [`get_config`]     |
//! | POST   | `/api/weather/location`            | [`set_location`]   |
//! | GET    | `/api/portfolio/symbols`           | [`get_symbols`]    |
//! | POST   | `/api/portfolio/symbols`           | [`set_symbols`]    |
//! | POST   | `/api/portfolio/symbol`            | [`add_symbol`]     |
//! | DELETE | `/api/portfolio/symbol/:symbol`    | [`remove_symbol`]  |
//! | GET    | `/api/portfolio/holdings`          | [`get_holdings`]   |
//! | POST   | `/api/portfolio/holdings`          | [`set_holdings`]   |
//! | POST   | `/api/portfolio/holding`           | [`upsert_holding`] |
//! | DELETE | `/api/portfolio/holding/:symbol`   | [`remove_holding`] |
//! | POST   | `/api/settings`                    | [`update_settings`]|
//!
//! Every failure is answered with `{"error": "<message>"}`:
//!
//! - 400 for unusable bodies (malformed JSON, missing fields, values that
//!   break a configuration rule)
//! - 404 when the geocoder does not know the ZIP code
//! - 502 when the geocoder cannot be reached
//! - 500 when the configuration file cannot be read or written

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use inkdash_core::{DashboardConfig, SettingsPatch};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::application::{ConfigService, ServiceError};
use crate::domain::messages::{
    ErrorResponse, HoldingRequest, HoldingsRequest, HoldingsResponse, LocationRequest,
    LocationResponse, SuccessResponse, SymbolRequest, SymbolsRequest, SymbolsResponse,
};
use crate::domain::RequestError;

type AppState = Arc<ConfigService>;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            ServiceError::ZipNotFound => ApiError::NotFound("ZIP code not found".to_string()),
            ServiceError::Geocoder(e) => {
                warn!("{e}");
                ApiError::BadGateway("Geocoding service unavailable".to_string())
            }
            ServiceError::Storage(e) => {
                error!("{e}");
                ApiError::Internal("Failed to access configuration".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(service: Arc<ConfigService>) -> Router {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/weather/location", post(set_location))
        .route("/api/portfolio/symbols", get(get_symbols).post(set_symbols))
        .route("/api/portfolio/symbol", post(add_symbol))
        .route("/api/portfolio/symbol/:symbol", delete(remove_symbol))
        .route("/api/portfolio/holdings", get(get_holdings).post(set_holdings))
        .route("/api/portfolio/holding", post(upsert_holding))
        .route("/api/portfolio/holding/:symbol", delete(remove_holding))
        .route("/api/settings", post(update_settings))
        .layer(middleware::from_fn(log_requests))
        .with_state(service)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    debug!("{method} {path} -> {}", response.status());
    response
}

/// Binds `addr` and serves the API until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server<F>(addr: SocketAddr, service: Arc<ConfigService>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web panel on {addr}"))?;
    info!("web panel listening on http://{addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("web server failed")?;
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn get_config(State(svc): State<AppState>) -> Result<Json<DashboardConfig>, ApiError> {
    Ok(Json(svc.config().await?))
}

pub async fn set_location(
    State(svc): State<AppState>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<LocationResponse>, ApiError> {
    let Json(req) = payload?;
    let location = svc.set_location(req.zip_code()?).await?;
    Ok(Json(LocationResponse {
        success: true,
        location: location.city,
        latitude: location.latitude,
        longitude: location.longitude,
    }))
}

pub async fn get_symbols(State(svc): State<AppState>) -> Result<Json<SymbolsResponse>, ApiError> {
    Ok(Json(SymbolsResponse::list(svc.symbols().await?)))
}

pub async fn set_symbols(
    State(svc): State<AppState>,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
) -> Result<Json<SymbolsResponse>, ApiError> {
    let Json(req) = payload?;
    let symbols = svc.set_symbols(&req.into_symbols()?).await?;
    Ok(Json(SymbolsResponse::updated(symbols)))
}

pub async fn add_symbol(
    State(svc): State<AppState>,
    payload: Result<Json<SymbolRequest>, JsonRejection>,
) -> Result<Json<SymbolsResponse>, ApiError> {
    let Json(req) = payload?;
    let symbols = svc.add_symbol(req.symbol()?).await?;
    Ok(Json(SymbolsResponse::updated(symbols)))
}

pub async fn remove_symbol(
    State(svc): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolsResponse>, ApiError> {
    let symbols = svc.remove_symbol(&symbol).await?;
    Ok(Json(SymbolsResponse::updated(symbols)))
}

pub async fn get_holdings(State(svc): State<AppState>) -> Result<Json<HoldingsResponse>, ApiError> {
    Ok(Json(HoldingsResponse::list(svc.holdings().await?)))
}

pub async fn set_holdings(
    State(svc): State<AppState>,
    payload: Result<Json<HoldingsRequest>, JsonRejection>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let Json(req) = payload?;
    let holdings = svc.set_holdings(req.into_holdings()?).await?;
    Ok(Json(HoldingsResponse::updated(holdings)))
}

pub async fn upsert_holding(
    State(svc): State<AppState>,
    payload: Result<Json<HoldingRequest>, JsonRejection>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let Json(req) = payload?;
    let holding = req
        .into_holding()
        .ok_or(RequestError::MissingField("symbol"))?;
    let holdings = svc.upsert_holding(holding).await?;
    Ok(Json(HoldingsResponse::updated(holdings)))
}

pub async fn remove_holding(
    State(svc): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let holdings = svc.remove_holding(&symbol).await?;
    Ok(Json(HoldingsResponse::updated(holdings)))
}

pub async fn update_settings(
    State(svc): State<AppState>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(patch) = payload?;
    svc.apply_settings(&patch).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
