use chrono::{Local, TimeZone};
use serde::Deserialize;
use serde_json::Value;

/// The independently polled dashboard series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKind {
    RequestRate,
    ServiceUp,
    Memory,
    Cpu,
    PodCount,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 5] = [
        SeriesKind::RequestRate,
        SeriesKind::ServiceUp,
        SeriesKind::Memory,
        SeriesKind::Cpu,
        SeriesKind::PodCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SeriesKind::RequestRate => "request-rate",
            SeriesKind::ServiceUp => "service-up",
            SeriesKind::Memory => "memory",
            SeriesKind::Cpu => "cpu",
            SeriesKind::PodCount => "pod-count",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SeriesKind::RequestRate => "HTTP Requests Rate (requests/second)",
            SeriesKind::ServiceUp => "Service Availability",
            SeriesKind::Memory => "Cluster Memory Usage (GB)",
            SeriesKind::Cpu => "Cluster CPU Usage (%)",
            SeriesKind::PodCount => "Running Pods Count",
        }
    }

    /// Candidate queries in priority order; the first one with data wins.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            SeriesKind::RequestRate => &["sum(rate(http_requests_total[1m]))"],
            SeriesKind::ServiceUp => &["up{job=\"backend-service\"}"],
            SeriesKind::Memory => &[
                "sum(container_memory_usage_bytes{container!=\"POD\",container!=\"\"}) / 1024 / 1024 / 1024",
                "sum(node_memory_MemTotal_bytes - node_memory_MemAvailable_bytes) / 1024 / 1024 / 1024",
            ],
            SeriesKind::Cpu => &[
                "sum(rate(container_cpu_usage_seconds_total{container!=\"POD\",container!=\"\"}[1m])) * 100",
                "sum(rate(node_cpu_seconds_total{mode!=\"idle\"}[1m])) / sum(rate(node_cpu_seconds_total[1m])) * 100",
            ],
            SeriesKind::PodCount => &[
                "count(kube_pod_info)",
                "count(container_start_time_seconds{container!=\"POD\",container!=\"\"})",
            ],
        }
    }

    pub fn format_value(self, value: f64) -> String {
        match self {
            SeriesKind::RequestRate => format!("{:.2} req/s", value),
            SeriesKind::ServiceUp if value == 1.0 => "Up".to_string(),
            SeriesKind::ServiceUp => "Down".to_string(),
            SeriesKind::Memory => format!("{:.2} GB", value),
            SeriesKind::Cpu => format!("{:.2} %", value),
            SeriesKind::PodCount => format!("{} pods", value.round() as i64),
        }
    }
}

/// One chart point. Rebuilt on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub value: f64,
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
}

impl MetricPoint {
    /// Builds a point from a `[epochSeconds, value]` sample. Either side may be a
    /// string or a number.
    pub fn from_sample(ts: &Value, value: &Value) -> Self {
        let timestamp = epoch_seconds(ts).saturating_mul(1000);
        MetricPoint {
            timestamp,
            value: sample_value(value),
            time: local_time(timestamp),
        }
    }
}

// fractional seconds are truncated
fn epoch_seconds(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let whole = s.trim().split('.').next().unwrap_or_default();
            whole.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

// NaN, infinities and garbage all plot as zero
fn sample_value(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

pub fn local_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Range-query envelope as returned by the relay. Every field is optional so
/// relay error bodies (`{"error": ..}`) decode too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<SeriesResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesResult {
    #[serde(default)]
    pub values: Option<Vec<(Value, Value)>>,
}

impl QueryResponse {
    /// Points of the first result series, or `None` when the response is not a
    /// success envelope carrying sample values.
    pub fn first_series_points(&self) -> Option<Vec<MetricPoint>> {
        if self.status.as_deref() != Some("success") {
            return None;
        }
        let values = self.data.as_ref()?.result.first()?.values.as_ref()?;
        Some(
            values
                .iter()
                .map(|(ts, v)| MetricPoint::from_sample(ts, v))
                .collect(),
        )
    }
}
