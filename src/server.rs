use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{RelayError, TrackError};
use crate::relay::ScriptRelay;
use crate::sheet::{AppsScriptSheet, SheetKey};
use crate::tracker::Tracker;
use crate::types::TrackingQuery;

const SHEET_CACHE_CONTROL: &str = "max-age=45, stale-while-revalidate=90";

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    tracker: Arc<Tracker>,
    sheet: Arc<AppsScriptSheet>,
    relay: Arc<ScriptRelay>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// `sheet` backs the read relay; pass the same instance the tracker uses.
    pub fn new(tracker: Tracker, sheet: Arc<AppsScriptSheet>, relay: ScriptRelay) -> Self {
        Self {
            tracker: Arc::new(tracker),
            sheet,
            relay: Arc::new(relay),
            metrics: Arc::new(Metrics {
                total_requests: AtomicU64::new(0),
                requests_in_flight: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
        }
    }
}

/// Tracking request counters
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> RequestGuard<'a> {
    fn enter(metrics: &'a Metrics) -> Self {
        metrics.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        Self(&metrics.requests_in_flight)
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Build the Axum application with routes and middleware
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/metrics", get(get_metrics))
        .route("/track", get(track))
        .route("/sheets", get(sheet_read))
        .route("/sheets/write", post(sheet_write))
        .route("/proxy", post(admin_proxy))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// Raw query pairs. Collecting into pairs never rejects, so repeated keys
/// reach the handler instead of producing a plain-text 400.
type QueryPairs = Query<Vec<(String, String)>>;

/// Last value of a repeated query key wins.
fn last_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Track by waybill or order ID. `selftest` short-circuits to diagnostics.
async fn track(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Response, TrackError> {
    if last_param(&pairs, "selftest").is_some() {
        return Ok(Json(state.tracker.self_test()).into_response());
    }

    let _guard = RequestGuard::enter(&state.metrics);

    let query = TrackingQuery::from_params(
        last_param(&pairs, "awb"),
        last_param(&pairs, "id"),
        last_param(&pairs, "service"),
    )?;

    match state.tracker.handle(&query).await {
        Ok(payload) => Ok(json_passthrough(StatusCode::OK, payload.into_body(), None)),
        Err(e) => {
            tracing::info!("Tracking failed: {} ({})", e, e.detail().unwrap_or(""));
            Err(e)
        }
    }
}

/// Read relay to the sheet. The upstream status and body are passed through.
async fn sheet_read(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Response, RelayError> {
    let (key, value) = match (last_param(&pairs, "id"), last_param(&pairs, "awb")) {
        (Some(id), _) => (SheetKey::Id, id),
        (None, Some(awb)) => (SheetKey::Awb, awb),
        (None, None) => {
            return Ok(Json(serde_json::json!({
                "ok": false,
                "error": "No ID or AWB provided"
            }))
            .into_response());
        }
    };

    let (status, body) = state.sheet.query(key, value).await?;
    Ok(json_passthrough(status, body, Some(SHEET_CACHE_CONTROL)))
}

async fn sheet_write(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let (status, body) = state.relay.write(&body).await?;
    Ok(json_passthrough(status, body, Some("no-store")))
}

async fn admin_proxy(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let body = state.relay.admin(body).await?;
    Ok(json_passthrough(StatusCode::OK, body, None))
}

fn json_passthrough(status: StatusCode, body: Bytes, cache_control: Option<&'static str>) -> Response {
    let mut response = (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        )],
        body,
    )
        .into_response();
    if let Some(value) = cache_control {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
    }
    response
}
