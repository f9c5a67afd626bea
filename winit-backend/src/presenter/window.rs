use std::fmt;
use std::str::FromStr;

/// Step sent with every dashboard range query, whatever the window.
pub const STEP_SECS: i64 = 30;

/// Selectable lookback presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    OneHour,
    SixHours,
    TwentyFourHours,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [
        TimeWindow::OneHour,
        TimeWindow::SixHours,
        TimeWindow::TwentyFourHours,
    ];

    pub fn duration_secs(self) -> i64 {
        match self {
            TimeWindow::OneHour => 3_600,
            TimeWindow::SixHours => 21_600,
            TimeWindow::TwentyFourHours => 86_400,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::OneHour => "1h",
            TimeWindow::SixHours => "6h",
            TimeWindow::TwentyFourHours => "24h",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown time window '{0}', expected one of 1h, 6h, 24h")]
pub struct UnknownWindow(String);

impl FromStr for TimeWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeWindow::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownWindow(s.to_string()))
    }
}

/// Bounds of one poll cycle, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl TimeRange {
    pub fn ending_at(window: TimeWindow, now: i64) -> Self {
        TimeRange {
            start: now - window.duration_secs(),
            end: now,
            step: STEP_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_expected_durations() {
        assert_eq!(TimeWindow::OneHour.duration_secs(), 3600);
        assert_eq!(TimeWindow::SixHours.duration_secs(), 21600);
        assert_eq!(TimeWindow::TwentyFourHours.duration_secs(), 86400);
        assert_eq!(TimeWindow::default(), TimeWindow::OneHour);
    }

    #[test]
    fn parses_labels() {
        for w in TimeWindow::ALL {
            assert_eq!(w.label().parse::<TimeWindow>().expect("parse"), w);
        }
        assert_eq!(" 24H ".parse::<TimeWindow>().expect("parse"), TimeWindow::TwentyFourHours);
        assert!("2h".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn range_step_is_fixed() {
        for w in TimeWindow::ALL {
            let r = TimeRange::ending_at(w, 100_000);
            assert_eq!(r.end, 100_000);
            assert_eq!(r.end - r.start, w.duration_secs());
            assert_eq!(r.step, STEP_SECS);
        }
    }
}
