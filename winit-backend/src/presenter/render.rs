use super::{DashboardState, SeriesKind};
use std::fmt::Write;

/// Plain-text rendering of the latest dashboard state.
pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Server Metrics Dashboard [{}]", state.window);

    if let Some(err) = &state.error {
        let _ = writeln!(out, "Error: {}", err);
        let _ = writeln!(out, "Press r to retry.");
        return out;
    }

    if state.is_empty() {
        if state.loading {
            let _ = writeln!(out, "Loading metrics...");
        } else {
            let _ = writeln!(out, "No metrics data available.");
        }
        return out;
    }

    for kind in SeriesKind::ALL {
        let points = state.points(kind);
        let Some(latest) = points.last() else {
            continue;
        };
        let _ = writeln!(
            out,
            "{}: {} points, latest {} at {}",
            kind.title(),
            points.len(),
            kind.format_value(latest.value),
            latest.time
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{MetricPoint, TimeWindow};

    fn point(value: f64) -> MetricPoint {
        MetricPoint {
            timestamp: 1_000_000,
            value,
            time: "12:00:00".into(),
        }
    }

    #[test]
    fn renders_only_populated_series() {
        let mut state = DashboardState {
            window: TimeWindow::SixHours,
            ..DashboardState::default()
        };
        state
            .series
            .insert(SeriesKind::RequestRate, vec![point(1.0), point(2.5)]);
        state.series.insert(SeriesKind::ServiceUp, vec![point(1.0)]);
        state.series.insert(SeriesKind::Memory, Vec::new());

        let text = render(&state);
        assert!(text.starts_with("Server Metrics Dashboard [6h]"));
        assert!(text.contains("HTTP Requests Rate (requests/second): 2 points, latest 2.50 req/s at 12:00:00"));
        assert!(text.contains("Service Availability: 1 points, latest Up at 12:00:00"));
        assert!(!text.contains("Cluster Memory Usage"));
    }

    #[test]
    fn empty_state_says_no_data() {
        let text = render(&DashboardState::default());
        assert!(text.contains("No metrics data available."));
    }

    #[test]
    fn error_banner_takes_precedence() {
        let mut state = DashboardState::default();
        state.series.insert(SeriesKind::Cpu, vec![point(10.0)]);
        state.error = Some("series task failed".into());
        let text = render(&state);
        assert!(text.contains("Error: series task failed"));
        assert!(text.contains("retry"));
        assert!(!text.contains("Cluster CPU Usage"));
    }
}
