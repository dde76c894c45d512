//! JSON HTTP front end.
//!
//! Routes:
//! - `GET /get_rate?date=&currency=` → `{"rate": "..."}`
//! - `GET /get_all_rates?date=` → array of listing rows
//! - `GET /health`
//!
//! Upstream failures are reported as 404 alongside "no data", never as 5xx.

use crate::core::rate::RatePageSource;
use crate::query::{self, QueryError};
use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared, read-only state of the running service.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn RatePageSource>,
}

impl AppState {
    pub fn new(source: Arc<dyn RatePageSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RateParams {
    date: Option<String>,
    currency: Option<String>,
}

impl RateParams {
    /// Maps axum's plain-text rejection (e.g. a repeated key) onto the JSON error contract.
    fn extract(params: Result<Query<Self>, QueryRejection>) -> Result<Self, QueryError> {
        params
            .map(|Query(params)| params)
            .map_err(|rejection| QueryError::InvalidQuery(rejection.body_text()))
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            QueryError::MissingParameter(name) => {
                (StatusCode::BAD_REQUEST, format!("缺少 {name} 參數"))
            }
            QueryError::InvalidQuery(detail) => (
                StatusCode::BAD_REQUEST,
                format!("查詢參數格式錯誤: {detail}"),
            ),
            QueryError::NotFound { date, currency } => (
                StatusCode::NOT_FOUND,
                format!("在 {date} 找不到 {currency} 的匯率，或當日非營業日"),
            ),
            QueryError::NoRates { date } => (
                StatusCode::NOT_FOUND,
                format!("在 {date} 找不到任何匯率資料，或當日非營業日"),
            ),
            QueryError::Network(_) => (StatusCode::NOT_FOUND, "找不到對應匯率".to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the router with all endpoints and permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/get_rate", get(get_rate))
        .route("/get_all_rates", get(get_all_rates))
        .layer(cors)
        .with_state(state)
}

/// Serve on `addr` until Ctrl-C.
pub async fn start(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Rate API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_rate(
    State(state): State<AppState>,
    params: Result<Query<RateParams>, QueryRejection>,
) -> Result<Json<Value>, QueryError> {
    let params = RateParams::extract(params)?;
    let date = query::require(params.date.as_deref(), "date")?;
    let currency = query::require(params.currency.as_deref(), "currency")?;
    info!(date, currency, "Rate query received");

    match query::spot_sell_rate(state.source.as_ref(), date, currency).await {
        Ok(rate) => {
            info!(date, currency, rate = %rate, "Rate query succeeded");
            Ok(Json(json!({ "rate": rate })))
        }
        Err(e) => {
            warn!(date, currency, error = %e, "Rate query failed");
            Err(e)
        }
    }
}

async fn get_all_rates(
    State(state): State<AppState>,
    params: Result<Query<RateParams>, QueryRejection>,
) -> Result<Response, QueryError> {
    let params = RateParams::extract(params)?;
    let date = query::require(params.date.as_deref(), "date")?;
    info!(date, "Listing query received");

    match query::all_rates(state.source.as_ref(), date).await {
        Ok(table) => {
            info!(date, rows = table.len(), "Listing query succeeded");
            Ok(Json(table).into_response())
        }
        Err(e) => {
            warn!(date, error = %e, "Listing query failed");
            Err(e)
        }
    }
}
