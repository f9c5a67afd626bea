use axum::{http::header, response::IntoResponse};

/// Hand-written exposition document. Values are fixed, not live counters.
pub const STATIC_METRICS: &str = r#"# HELP http_requests_total Total number of HTTP requests
# TYPE http_requests_total counter
http_requests_total{method="GET",endpoint="/"} 1
http_requests_total{method="GET",endpoint="/health"} 1
http_requests_total{method="GET",endpoint="/metrics"} 1

# HELP service_info Service information
# TYPE service_info gauge
service_info{version="1.0.0",name="winit-backend"} 1
"#;

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        STATIC_METRICS,
    )
}
