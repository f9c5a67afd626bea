use super::series::QueryResponse;
use super::window::TimeRange;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Where the presenter gets range-query results from.
#[async_trait]
pub trait RangeSource: Send + Sync {
    async fn query_range(&self, query: &str, range: &TimeRange) -> anyhow::Result<QueryResponse>;
}

/// Calls the relay's `/api/prometheus/query_range` endpoint over HTTP.
pub struct HttpRangeSource {
    client: Client,
    api_url: String,
}

impl HttpRangeSource {
    pub fn new(api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Url::parse(api_url)
            .map_err(|e| anyhow::anyhow!("Invalid dashboard API URL '{}': {}", api_url, e))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RangeSource for HttpRangeSource {
    async fn query_range(
        &self,
        query: &str,
        range: &TimeRange,
    ) -> anyhow::Result<QueryResponse> {
        let resp = self
            .client
            .get(format!("{}/api/prometheus/query_range", self.api_url))
            .query(&[
                ("query", query.to_string()),
                ("start", range.start.to_string()),
                ("end", range.end.to_string()),
                ("step", range.step.to_string()),
            ])
            .send()
            .await?;
        debug!(status = %resp.status(), %query, "Relay responded");
        Ok(resp.json::<QueryResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::TimeWindow;
    use crate::test_support::spawn_router;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn forwards_range_parameters_to_relay() {
        let app = Router::new().route(
            "/api/prometheus/query_range",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "status": "success",
                    "data": { "result": [{ "values": [[q["start"], q["step"]], [q["end"], "1"]] }] }
                }))
            }),
        );
        let url = spawn_router(app).await;
        let source = HttpRangeSource::new(&format!("{}/", url), Duration::from_secs(2)).expect("source");

        let range = TimeRange::ending_at(TimeWindow::SixHours, 100_000);
        let resp = source.query_range("up", &range).await.expect("query");
        let points = resp.first_series_points().expect("points");
        assert_eq!(points[0].timestamp, (100_000 - 21_600) * 1000);
        assert_eq!(points[0].value, 30.0);
        assert_eq!(points[1].timestamp, 100_000 * 1000);
    }

    #[tokio::test]
    async fn relay_error_body_decodes_without_points() {
        let app = Router::new().route(
            "/api/prometheus/query_range",
            get(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to query Prometheus", "message": "boom" })),
                )
            }),
        );
        let url = spawn_router(app).await;
        let source = HttpRangeSource::new(&url, Duration::from_secs(2)).expect("source");
        let resp = source
            .query_range("up", &TimeRange::ending_at(TimeWindow::OneHour, 10_000))
            .await
            .expect("decodes");
        assert!(resp.first_series_points().is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error() {
        let source = HttpRangeSource::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("source");
        let result = source
            .query_range("up", &TimeRange::ending_at(TimeWindow::OneHour, 10_000))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_api_url() {
        assert!(HttpRangeSource::new("relay-without-scheme", Duration::from_secs(1)).is_err());
    }
}
