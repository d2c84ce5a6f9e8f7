//! Host lifecycle events and the refresh schedule built on them.
//!
//! The host app publishes [`AppState`] transitions through
//! [`LifecycleEvents`]. A [`RefreshSchedule`] is the one handle that owns
//! both the recurring timer and the subscription to those events; dropping
//! it releases both.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Capacity of the lifecycle broadcast channel.
const LIFECYCLE_CHANNEL_CAPACITY: usize = 16;

/// Foreground state of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

/// Whether moving from `previous` to `next` brings the app back to the
/// foreground.
pub fn is_foreground_resume(previous: AppState, next: AppState) -> bool {
    previous != AppState::Active && next == AppState::Active
}

/// Tracks the last seen state and reports foreground resumes.
#[derive(Debug, Clone)]
pub struct ForegroundDetector {
    last: AppState,
}

impl ForegroundDetector {
    pub fn new(initial: AppState) -> Self {
        Self { last: initial }
    }

    /// Last observed state.
    pub fn current(&self) -> AppState {
        self.last
    }

    /// Record a new state; returns true on a foreground resume.
    pub fn observe(&mut self, next: AppState) -> bool {
        let resumed = is_foreground_resume(self.last, next);
        self.last = next;
        resumed
    }
}

/// Publisher side of the host lifecycle stream.
#[derive(Debug, Clone)]
pub struct LifecycleEvents {
    tx: broadcast::Sender<AppState>,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a state change. Returns the number of listeners reached.
    pub fn emit(&self, state: AppState) -> usize {
        self.tx.send(state).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a fetch cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First fetch right after consent was granted
    Initial,
    /// Recurring timer tick
    Timer,
    /// App returned to the foreground
    ForegroundResume,
    /// Explicit refresh call
    Manual,
}

/// Scoped handle owning the refresh timer and the lifecycle subscription.
///
/// Both live inside a single spawned task. Each trigger runs in its own
/// child task owned by that task, so a slow or stuck fetch never holds back
/// the next tick or resume. The task, children included, is stopped exactly
/// once, either by [`RefreshSchedule::shutdown`] or on drop.
#[derive(Debug)]
pub struct RefreshSchedule {
    handle: Option<JoinHandle<()>>,
}

impl RefreshSchedule {
    /// Start the schedule.
    ///
    /// `on_trigger` runs on every timer tick (the first one a full `period`
    /// from now) and on every foreground resume seen on `lifecycle`.
    /// Triggered futures may overlap.
    pub fn spawn<F, Fut>(
        period: Duration,
        mut lifecycle: broadcast::Receiver<AppState>,
        on_trigger: F,
    ) -> Self
    where
        F: Fn(RefreshTrigger) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut detector = ForegroundDetector::new(AppState::Active);
            let mut listening = true;
            let mut in_flight = JoinSet::new();

            info!(period_secs = period.as_secs(), "Refresh schedule started");

            loop {
                tokio::select! {
                    biased;

                    _ = interval.tick() => {
                        in_flight.spawn(on_trigger(RefreshTrigger::Timer));
                    }
                    event = lifecycle.recv(), if listening => match event {
                        Ok(state) => {
                            let previous = detector.current();
                            if detector.observe(state) {
                                debug!(?previous, "Foreground resume");
                                in_flight.spawn(on_trigger(RefreshTrigger::ForegroundResume));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Missed lifecycle events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Lifecycle stream closed");
                            listening = false;
                        }
                    },
                    Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = done {
                            warn!("Refresh task failed: {e}");
                        }
                    }
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Whether the schedule task is still running.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the schedule and wait until the timer and subscription are gone.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Resolves once the task, and everything it owns, has been dropped.
            // Dropping its JoinSet aborts any fetch still in flight.
            let _ = handle.await;
            info!("Refresh schedule stopped");
        }
    }
}

impl Drop for RefreshSchedule {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
