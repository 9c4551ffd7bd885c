//! HTTP API server.
//!
//! Exposes the digest pipeline and store over a small JSON/text API. On
//! startup, today's digest is generated in the background so the first
//! request does not pay the full fetch-and-summarize latency; a failure
//! there is logged and retried lazily on the next request.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Service description and endpoint map |
//! | `GET`  | `/digest` | Today's digest as JSON (generates if absent) |
//! | `GET`  | `/digest/markdown` | Today's digest as Markdown |
//! | `GET`  | `/digest/telegram` | Today's digest as Telegram HTML |
//! | `POST` | `/digest/refresh` | Regenerate today's digest |
//! | `GET`  | `/digests` | Stored digest dates, most recent first |
//! | `GET`  | `/digests/{date}` | Stored digest for a date (never generates) |
//! | `GET`  | `/stats` | Storage statistics |
//! | `GET`  | `/health` | Health check (version and timestamp) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no digest stored for 2024-01-01" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `generation_failed` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the digest can be
//! embedded in browser-based readers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::render::{format_digest_markdown, format_digest_telegram, DigestView};
use crate::service::DigestService;
use crate::store::StoreStats;

/// Dates returned by `GET /digests` when no `limit` is given.
const DEFAULT_LIST_LIMIT: usize = 30;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    service: Arc<DigestService>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind`, wires the pipeline
/// from configuration (this requires `ANTHROPIC_API_KEY`), and runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let service = Arc::new(DigestService::from_config(config)?);

    // Warm today's digest without blocking startup.
    let startup_service = service.clone();
    tokio::spawn(async move {
        match startup_service
            .get_or_generate(DigestService::today(), false)
            .await
        {
            Ok(digest) => info!("Initial digest ready: {} stories", digest.stories.len()),
            Err(err) => warn!("Initial digest generation failed: {err:#}"),
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/digest", get(handle_digest))
        .route("/digest/markdown", get(handle_digest_markdown))
        .route("/digest/telegram", get(handle_digest_telegram))
        .route("/digest/refresh", post(handle_refresh))
        .route("/digests", get(handle_list_dates))
        .route("/digests/{date}", get(handle_get_date))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service });

    println!("Digest server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for digest pipeline failures.
fn generation_failed(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "generation_failed".to_string(),
        message: format!("{err:#}"),
    }
}

/// Constructs a 500 error for storage and other internal failures.
fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{err:#}"),
    }
}

// ============ GET / ============

/// Handler for `GET /`. Returns the service description and endpoint map.
async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "HN Digest",
        "description": "AI-powered daily Hacker News digest in Chinese",
        "endpoints": {
            "/digest": "Get today's digest (JSON)",
            "/digest/markdown": "Get today's digest (Markdown)",
            "/digest/telegram": "Get today's digest (Telegram HTML)",
            "/digest/refresh": "Force refresh today's digest (POST)",
            "/digests": "List stored digest dates",
            "/digests/{date}": "Get the digest stored for a date",
            "/stats": "Storage statistics",
        }
    }))
}

// ============ GET /digest ============

/// Handler for `GET /digest`.
///
/// Returns today's digest as JSON, running the pipeline first if no digest
/// is stored for today.
async fn handle_digest(State(state): State<AppState>) -> Result<Json<DigestView>, AppError> {
    let digest = state
        .service
        .get_or_generate(DigestService::today(), false)
        .await
        .map_err(generation_failed)?;
    Ok(Json(DigestView::from(&digest)))
}

/// Handler for `GET /digest/markdown`. Plain-text Markdown rendering.
async fn handle_digest_markdown(State(state): State<AppState>) -> Result<String, AppError> {
    let digest = state
        .service
        .get_or_generate(DigestService::today(), false)
        .await
        .map_err(generation_failed)?;
    Ok(format_digest_markdown(&digest))
}

/// Handler for `GET /digest/telegram`. HTML-flavored rendering for Telegram.
async fn handle_digest_telegram(
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let digest = state
        .service
        .get_or_generate(DigestService::today(), false)
        .await
        .map_err(generation_failed)?;
    Ok(Html(format_digest_telegram(&digest)))
}

// ============ POST /digest/refresh ============

/// JSON response body for `POST /digest/refresh`.
#[derive(Serialize)]
struct RefreshResponse {
    success: bool,
    date: String,
    story_count: usize,
}

/// Handler for `POST /digest/refresh`.
///
/// Unconditionally reruns the pipeline for today and replaces the stored
/// digest.
async fn handle_refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let digest = state
        .service
        .get_or_generate(DigestService::today(), true)
        .await
        .map_err(generation_failed)?;
    Ok(Json(RefreshResponse {
        success: true,
        story_count: digest.stories.len(),
        date: digest.date,
    }))
}

// ============ GET /digests ============

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

/// JSON response body for `GET /digests`.
#[derive(Serialize)]
struct DatesResponse {
    dates: Vec<String>,
}

/// Handler for `GET /digests?limit=N`. Lists stored dates, newest first.
async fn handle_list_dates(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<DatesResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let dates = state.service.list_dates(limit).await.map_err(internal)?;
    Ok(Json(DatesResponse { dates }))
}

// ============ GET /digests/{date} ============

/// Handler for `GET /digests/{date}`.
///
/// Returns the stored digest for an ISO date. Unlike `/digest`, this never
/// triggers generation: a missing date is a plain 404.
async fn handle_get_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DigestView>, AppError> {
    let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| bad_request(format!("invalid date: {date} (expected YYYY-MM-DD)")))?;
    let digest = state
        .service
        .lookup(&parsed.to_string())
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("no digest stored for {parsed}")))?;
    Ok(Json(DigestView::from(&digest)))
}

// ============ GET /stats ============

/// Handler for `GET /stats`. Reports record count, total size, and location.
async fn handle_stats(State(state): State<AppState>) -> Result<Json<StoreStats>, AppError> {
    Ok(Json(state.service.stats().await.map_err(internal)?))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    timestamp: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
