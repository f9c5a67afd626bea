use crate::error::RelayError;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Range covered when the caller gives no `start`.
pub const DEFAULT_RANGE_SECS: i64 = 3600;
pub const DEFAULT_STEP: &str = "15";

/// Queries aggregated by the summary endpoint, in request order.
pub const SUMMARY_QUERIES: [&str; 3] = [
    "up{job=\"backend-service\"}",
    "http_requests_total",
    "service_info",
];

#[derive(Debug, Deserialize)]
pub struct InstantParams {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub query: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<String>,
}

/// Resolved `start`/`end`/`step` for a range query, as sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: String,
    pub end: String,
    pub step: String,
}

impl RangeWindow {
    /// Fills absent (or empty) bounds with "last hour, 15 second step" relative to `now`.
    pub fn resolve(
        start: Option<String>,
        end: Option<String>,
        step: Option<String>,
        now: i64,
    ) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        RangeWindow {
            start: present(start).unwrap_or_else(|| (now - DEFAULT_RANGE_SECS).to_string()),
            end: present(end).unwrap_or_else(|| now.to_string()),
            step: present(step).unwrap_or_else(|| DEFAULT_STEP.to_string()),
        }
    }

    pub fn last_hour(now: i64) -> Self {
        Self::resolve(None, None, None, now)
    }
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn required_query(query: Option<String>) -> Result<String, RelayError> {
    query
        .filter(|q| !q.is_empty())
        .ok_or(RelayError::MissingQuery)
}

async fn fetch_json(
    state: &AppState,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<Value, reqwest::Error> {
    // The upstream status is not inspected; Prometheus reports query errors in the JSON body.
    let resp = state
        .client
        .get(state.upstream_endpoint(endpoint))
        .query(params)
        .send()
        .await?;
    debug!(status = %resp.status(), endpoint, "Upstream responded");
    resp.json::<Value>().await
}

pub async fn instant_query(state: &AppState, query: &str) -> Result<Value, reqwest::Error> {
    fetch_json(state, "query", &[("query", query)]).await
}

pub async fn range_query(
    state: &AppState,
    query: &str,
    window: &RangeWindow,
) -> Result<Value, reqwest::Error> {
    fetch_json(
        state,
        "query_range",
        &[
            ("query", query),
            ("start", window.start.as_str()),
            ("end", window.end.as_str()),
            ("step", window.step.as_str()),
        ],
    )
    .await
}

pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<InstantParams>, QueryRejection>,
) -> Result<Json<Value>, RelayError> {
    let Query(params) = params?;
    let query = required_query(params.query)?;
    debug!(%query, "Relaying instant query");

    match instant_query(&state, &query).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            error!("Instant query '{}' failed: {}", query, e);
            Err(e.into())
        }
    }
}

pub async fn query_range_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Value>, RelayError> {
    let Query(params) = params?;
    let query = required_query(params.query)?;
    let window = RangeWindow::resolve(params.start, params.end, params.step, now_secs());
    debug!(
        %query,
        start = %window.start,
        end = %window.end,
        step = %window.step,
        "Relaying range query"
    );

    match range_query(&state, &query, &window).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            error!("Range query '{}' failed: {}", query, e);
            Err(e.into())
        }
    }
}

/// Runs the summary queries one after another over the last hour. A failed
/// query is recorded under its own key and does not stop the others.
pub async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let window = RangeWindow::last_hour(now_secs());
    let mut results = serde_json::Map::new();
    let mut failed = 0usize;

    for query in SUMMARY_QUERIES {
        let value = match range_query(&state, query, &window).await {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to query {}: {}", query, e);
                failed += 1;
                json!({ "error": "Query failed" })
            }
        };
        results.insert(query.to_string(), value);
    }

    info!(
        queries = SUMMARY_QUERIES.len(),
        failed, "Metrics summary assembled"
    );
    Json(Value::Object(results))
}
