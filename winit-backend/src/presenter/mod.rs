//! Polling presenter for the metrics dashboard.
//!
//! Every cycle re-fetches all series for the selected window through a
//! [`RangeSource`] and replaces the previous points wholesale. Series are
//! fetched concurrently and isolated from each other: a failed or empty series
//! only blanks itself. A fault in the cycle itself is reported as a page-level
//! error on [`DashboardState::error`].

pub mod render;
pub mod series;
pub mod source;
pub mod window;

pub use render::render;
pub use series::{MetricPoint, QueryResponse, SeriesKind};
pub use source::{HttpRangeSource, RangeSource};
pub use window::{TimeRange, TimeWindow, STEP_SECS};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What the dashboard shows after the latest cycle.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub window: TimeWindow,
    pub series: BTreeMap<SeriesKind, Vec<MetricPoint>>,
    pub loading: bool,
    /// Page-level error from the last cycle, if it failed as a whole.
    pub error: Option<String>,
    /// Completed or failed cycles so far.
    pub cycles: u64,
}

impl DashboardState {
    pub fn points(&self, kind: SeriesKind) -> &[MetricPoint] {
        self.series.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    /// A cycle for the same window was still in flight.
    Skipped,
    /// Finished after another window was selected; its points were dropped.
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("series task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn flight_slot(window: TimeWindow) -> usize {
    match window {
        TimeWindow::OneHour => 0,
        TimeWindow::SixHours => 1,
        TimeWindow::TwentyFourHours => 2,
    }
}

/// Clears the in-flight flag when a cycle ends, including when it is dropped.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Tries each candidate query in order and returns the points of the first one
/// with data. Errors are logged and fall through to the next candidate.
pub async fn fetch_series(
    source: &dyn RangeSource,
    kind: SeriesKind,
    range: &TimeRange,
) -> Vec<MetricPoint> {
    for query in kind.candidates() {
        match source.query_range(query, range).await {
            Ok(resp) => {
                if let Some(points) = resp.first_series_points() {
                    debug!(series = kind.name(), %query, points = points.len(), "Series fetched");
                    return points;
                }
                match &resp.error {
                    Some(err) => warn!(
                        series = kind.name(),
                        %query,
                        error = %err,
                        "Series query returned an error"
                    ),
                    None => debug!(series = kind.name(), %query, "Series query returned no data"),
                }
            }
            Err(e) => warn!(series = kind.name(), %query, "Failed to fetch series: {:#}", e),
        }
    }
    Vec::new()
}

pub struct Presenter {
    source: Arc<dyn RangeSource>,
    state: RwLock<DashboardState>,
    /// One flag per window.
    in_flight: [AtomicBool; 3],
    updates: watch::Sender<u64>,
}

impl Presenter {
    pub fn new(source: Arc<dyn RangeSource>) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            source,
            state: RwLock::new(DashboardState::default()),
            in_flight: Default::default(),
            updates,
        }
    }

    /// Receives the cycle count after every finished cycle.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn poll(&self, window: TimeWindow) -> PollOutcome {
        self.poll_at(window, chrono::Utc::now().timestamp()).await
    }

    /// Runs one cycle for the window ending at `now` (epoch seconds).
    pub async fn poll_at(&self, window: TimeWindow, now: i64) -> PollOutcome {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight[flight_slot(window)]) else {
            debug!(%window, "Poll cycle still in flight, skipping");
            // the running cycle for this window is the one to publish
            self.state.write().await.window = window;
            return PollOutcome::Skipped;
        };

        {
            let mut st = self.state.write().await;
            st.loading = true;
            st.window = window;
        }

        let range = TimeRange::ending_at(window, now);
        let result = self.run_cycle(&range).await;

        let (outcome, cycles) = {
            let mut st = self.state.write().await;
            if st.window != window {
                debug!(%window, current = %st.window, "Dropping points of a superseded cycle");
                return PollOutcome::Superseded;
            }
            st.loading = false;
            st.cycles += 1;
            let outcome = match result {
                Ok(series) => {
                    st.series = series;
                    st.error = None;
                    PollOutcome::Completed
                }
                Err(e) => {
                    // previous points stay on screen behind the banner
                    error!(%window, "Poll cycle failed: {}", e);
                    st.error = Some(e.to_string());
                    PollOutcome::Failed
                }
            };
            (outcome, st.cycles)
        };
        self.updates.send_replace(cycles);
        outcome
    }

    async fn run_cycle(
        &self,
        range: &TimeRange,
    ) -> Result<BTreeMap<SeriesKind, Vec<MetricPoint>>, PollError> {
        // dropping the set aborts whatever is still running
        let mut tasks = JoinSet::new();
        for kind in SeriesKind::ALL {
            let source = Arc::clone(&self.source);
            let range = *range;
            tasks.spawn(async move {
                let points = fetch_series(source.as_ref(), kind, &range).await;
                (kind, points)
            });
        }

        let mut series = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (kind, points) = joined?;
            series.insert(kind, points);
        }
        Ok(series)
    }

    /// Spawns the repeating poll loop. The first cycle starts immediately.
    pub fn start(self: Arc<Self>, window: TimeWindow, period: Duration) -> PollerHandle {
        let cancel = CancellationToken::new();
        let (window_tx, mut window_rx) = watch::channel(window);
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn({
            let cancel = cancel.clone();
            let refresh = Arc::clone(&refresh);
            async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                let mut window = *window_rx.borrow_and_update();
                info!(?period, %window, "Dashboard poller started");

                loop {
                    // A window change abandons the cycle still running for the old window.
                    let switched = tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.poll(window) => false,
                        changed = window_rx.changed() => match changed {
                            Ok(()) => true,
                            Err(_) => break,
                        },
                    };

                    if switched {
                        debug!(%window, "Window changed mid-cycle, abandoning it");
                        ticker.reset();
                    } else {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = ticker.tick() => {}
                            changed = window_rx.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                                ticker.reset();
                            }
                            _ = refresh.notified() => {}
                        }
                    }
                    window = *window_rx.borrow_and_update();
                }
                info!("Dashboard poller stopped");
            }
        });

        PollerHandle {
            cancel,
            window: window_tx,
            refresh,
            task,
        }
    }
}

/// Control side of a running poll loop.
pub struct PollerHandle {
    cancel: CancellationToken,
    window: watch::Sender<TimeWindow>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Switches the window and polls right away. Selecting the current window is a no-op.
    pub fn set_window(&self, window: TimeWindow) {
        self.window.send_if_modified(|current| {
            if *current == window {
                return false;
            }
            *current = window;
            true
        });
    }

    pub fn window(&self) -> TimeWindow {
        *self.window.borrow()
    }

    /// Requests an extra cycle outside the regular cadence.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Cancels the timer and waits for the loop to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Dashboard poller ended abnormally: {}", e);
        }
    }
}
