//! The health sync controller.
//!
//! Owns the refresh lifecycle of one session: availability check, consent,
//! the first fetch, the recurring and foreground-resume fetches, and
//! teardown. Consumers read the current [`SyncState`] or subscribe to it.
//!
//! ```text
//! Uninitialized -> CheckingAvailability -> Disabled
//!                         |
//!                         v
//!                 RequestingPermission -> Idle (denied)
//!                         |
//!                         v
//!                     Fetching <-> Idle   (timer tick, foreground resume)
//!
//! any -> TornDown
//! ```

use crate::core::records::{LatestVitals, WorkoutRecord};
use crate::provider::{HealthProvider, Platform};
use crate::sync::fetcher::HealthFetcher;
use crate::sync::gateway::HealthGateway;
use crate::sync::lifecycle::{LifecycleEvents, RefreshSchedule, RefreshTrigger};
use crate::transparency::{CycleOutcome, SharedTransparencyLog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default period of the recurring fetch.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default upper bound on workouts per fetch.
pub const DEFAULT_WORKOUT_LIMIT: usize = 10;

/// Shortest period the scheduler accepts.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Controller settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the recurring fetch
    pub refresh_interval: Duration,
    /// Upper bound passed to the workouts query
    pub workout_limit: usize,
    /// Platform the controller runs on
    pub platform: Platform,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            workout_limit: DEFAULT_WORKOUT_LIMIT,
            platform: Platform::current(),
        }
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Uninitialized,
    CheckingAvailability,
    /// Provider unsupported or unavailable; nothing more happens
    Disabled,
    RequestingPermission,
    Fetching,
    Idle,
    TornDown,
}

/// Everything a consumer needs to render or persist health data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Computed once at construction
    pub is_available: bool,
    pub is_authorized: bool,
    /// Latest snapshot, absent until the first successful fetch
    pub vitals: Option<LatestVitals>,
    /// Most recent first
    pub workouts: Vec<WorkoutRecord>,
    /// True until initialization completes
    pub is_loading: bool,
    pub phase: SyncPhase,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncState {
    fn initial(is_available: bool) -> Self {
        Self {
            is_available,
            is_authorized: false,
            vitals: None,
            workouts: Vec::new(),
            is_loading: true,
            phase: SyncPhase::Uninitialized,
            last_synced_at: None,
        }
    }
}

/// State shared between the controller and its refresh schedule task.
struct SyncCore<P: HealthProvider> {
    gateway: HealthGateway<P>,
    fetcher: HealthFetcher<P>,
    state: watch::Sender<SyncState>,
    workout_limit: usize,
    transparency: Option<SharedTransparencyLog>,
    torn_down: AtomicBool,
    /// Fetch cycles currently running
    in_flight: AtomicUsize,
}

/// Marks one running fetch cycle; the phase follows the count.
struct CycleGuard<'a, P: HealthProvider> {
    core: &'a SyncCore<P>,
}

impl<'a, P: HealthProvider> CycleGuard<'a, P> {
    fn enter(core: &'a SyncCore<P>) -> Self {
        core.in_flight.fetch_add(1, Ordering::SeqCst);
        core.sync_fetch_phase();
        Self { core }
    }
}

impl<P: HealthProvider> Drop for CycleGuard<'_, P> {
    fn drop(&mut self) {
        self.core.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.core.sync_fetch_phase();
    }
}

impl<P: HealthProvider> SyncCore<P> {
    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.state.send_if_modified(|s| {
            // TornDown is terminal.
            if s.phase == SyncPhase::TornDown || s.phase == phase {
                return false;
            }
            s.phase = phase;
            true
        });
    }

    /// `Fetching` while any cycle runs, `Idle` once none do.
    ///
    /// The count is read under the state lock, so the last update to run
    /// always sees the final count.
    fn sync_fetch_phase(&self) {
        self.state.send_if_modified(|s| {
            if s.phase == SyncPhase::TornDown {
                return false;
            }
            let phase = if self.in_flight.load(Ordering::SeqCst) > 0 {
                SyncPhase::Fetching
            } else {
                SyncPhase::Idle
            };
            let changed = s.phase != phase;
            s.phase = phase;
            changed
        });
    }

    /// Run one fetch cycle and publish its snapshot.
    ///
    /// Returns false when the cycle was skipped or discarded. A discarded
    /// cycle leaves the previous snapshot in place. Cycles may overlap; each
    /// one replaces the whole snapshot, so the last to complete wins.
    async fn fetch(&self, trigger: RefreshTrigger) -> bool {
        let available = self.state.borrow().is_available;
        if self.is_torn_down() || !available {
            return false;
        }

        debug!(?trigger, "Fetch cycle started");
        let _cycle = CycleGuard::enter(self);

        let (vitals, workouts) = tokio::join!(
            self.fetcher.fetch_latest_vitals(),
            self.fetcher.fetch_recent_workouts(self.workout_limit)
        );

        let workouts = match workouts {
            Ok(workouts) => workouts,
            Err(e) => {
                warn!(?trigger, "Fetch cycle discarded: {e}");
                if let Some(log) = &self.transparency {
                    log.record_cycle(CycleOutcome::Discarded);
                }
                return false;
            }
        };

        if self.is_torn_down() {
            return false;
        }

        let vital_count = vitals.present_count() as u64;
        let workout_count = workouts.len() as u64;

        // Whole-snapshot replace; the phase is settled when the guard drops.
        self.state.send_modify(|s| {
            s.vitals = Some(vitals);
            s.workouts = workouts;
            s.last_synced_at = Some(Utc::now());
        });

        if let Some(log) = &self.transparency {
            log.record_cycle(CycleOutcome::Completed {
                vital_samples: vital_count,
                workouts: workout_count,
            });
        }
        info!(
            ?trigger,
            vitals = vital_count,
            workouts = workout_count,
            "Fetch cycle complete"
        );
        true
    }
}

/// Drives availability, consent and refreshes for one session.
pub struct HealthSyncController<P: HealthProvider + 'static> {
    core: Arc<SyncCore<P>>,
    refresh_interval: Duration,
    schedule: Option<RefreshSchedule>,
    initialized: bool,
}

impl<P: HealthProvider + 'static> HealthSyncController<P> {
    /// Create a controller. Availability is computed here, once.
    pub fn new(provider: Arc<P>, config: SyncConfig) -> Self {
        Self::build(provider, config, None)
    }

    /// Create a controller that reports collection to a transparency log.
    pub fn with_transparency_log(
        provider: Arc<P>,
        config: SyncConfig,
        log: SharedTransparencyLog,
    ) -> Self {
        Self::build(provider, config, Some(log))
    }

    fn build(provider: Arc<P>, config: SyncConfig, log: Option<SharedTransparencyLog>) -> Self {
        let gateway = HealthGateway::new(Arc::clone(&provider), config.platform);
        let is_available = gateway.check_availability();
        let (state, _) = watch::channel(SyncState::initial(is_available));

        Self {
            core: Arc::new(SyncCore {
                gateway,
                fetcher: HealthFetcher::new(provider),
                state,
                workout_limit: config.workout_limit,
                transparency: log,
                torn_down: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
            }),
            refresh_interval: config.refresh_interval.max(MIN_REFRESH_INTERVAL),
            schedule: None,
            initialized: false,
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> SyncState {
        self.core.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.core.state.subscribe()
    }

    /// Whether the recurring fetch and resume listener are held.
    pub fn is_scheduled(&self) -> bool {
        self.schedule.as_ref().is_some_and(RefreshSchedule::is_active)
    }

    /// Check availability, request consent, and fetch once if granted.
    ///
    /// Always ends with `is_loading` cleared. Releases the refresh schedule
    /// if the session turns out to be unavailable or unauthorized.
    pub async fn initialize(&mut self) -> SyncState {
        if self.core.is_torn_down() {
            return self.state();
        }
        self.initialized = true;
        self.core.set_phase(SyncPhase::CheckingAvailability);

        let available = self.core.state.borrow().is_available;
        if !available {
            info!(
                platform = %self.core.gateway.platform(),
                "Health data unavailable, sync disabled"
            );
            self.core.state.send_modify(|s| {
                s.is_authorized = false;
                s.is_loading = false;
                s.phase = SyncPhase::Disabled;
            });
            self.release_schedule().await;
            return self.state();
        }

        self.core.set_phase(SyncPhase::RequestingPermission);
        if let Some(log) = &self.core.transparency {
            log.record_permission_request();
        }
        let granted = self.core.gateway.request_permissions().await;
        self.core.state.send_modify(|s| s.is_authorized = granted);

        if granted {
            self.core.fetch(RefreshTrigger::Initial).await;
        } else {
            info!("Health data access denied");
            self.release_schedule().await;
        }

        self.core.state.send_modify(|s| {
            s.is_loading = false;
            if s.phase != SyncPhase::TornDown {
                s.phase = SyncPhase::Idle;
            }
        });
        self.state()
    }

    /// Start the session: initialize once, then hold the refresh schedule
    /// while available and authorized.
    pub async fn mount(&mut self, lifecycle: &LifecycleEvents) {
        if self.core.is_torn_down() {
            return;
        }
        if !self.initialized {
            self.initialize().await;
        }
        if self.schedule.is_some() || !self.should_schedule() {
            return;
        }

        let core = Arc::clone(&self.core);
        self.schedule = Some(RefreshSchedule::spawn(
            self.refresh_interval,
            lifecycle.subscribe(),
            move |trigger| {
                let core = Arc::clone(&core);
                async move {
                    core.fetch(trigger).await;
                }
            },
        ));
    }

    /// Fetch now, outside the schedule.
    ///
    /// A no-op returning false when unavailable or torn down.
    pub async fn refresh(&self) -> bool {
        self.core.fetch(RefreshTrigger::Manual).await
    }

    /// End the session, releasing the timer and resume listener.
    pub async fn unmount(&mut self) {
        self.core.torn_down.store(true, Ordering::SeqCst);
        self.release_schedule().await;
        self.core.set_phase(SyncPhase::TornDown);
    }

    fn should_schedule(&self) -> bool {
        let state = self.core.state.borrow();
        state.is_available && state.is_authorized && !self.core.is_torn_down()
    }

    async fn release_schedule(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.shutdown().await;
        }
    }
}

impl<P: HealthProvider + 'static> Drop for HealthSyncController<P> {
    fn drop(&mut self) {
        self.core.torn_down.store(true, Ordering::SeqCst);
        // Dropping the handle aborts the schedule task.
        drop(self.schedule.take());
        self.core.set_phase(SyncPhase::TornDown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::VitalType;
    use crate::provider::types::{RawSample, RawTimestamp};
    use crate::provider::{FixtureData, FixtureProvider};
    use crate::transparency::create_shared_log;
    use std::collections::HashMap;

    fn ios_config() -> SyncConfig {
        SyncConfig {
            platform: Platform::Ios,
            ..Default::default()
        }
    }

    fn heart_rate(value: f64) -> HashMap<VitalType, RawSample> {
        HashMap::from([(
            VitalType::HeartRate,
            RawSample {
                quantity: Some(value),
                unit: None,
                start_time: RawTimestamp::from("2024-03-05T08:00:00Z"),
                end_time: RawTimestamp::from("2024-03-05T08:00:00Z"),
            },
        )])
    }

    #[test]
    fn test_initial_state() {
        let provider = Arc::new(FixtureProvider::default());
        let controller = HealthSyncController::new(provider, ios_config());
        let state = controller.state();

        assert!(state.is_available);
        assert!(state.is_loading);
        assert!(!state.is_authorized);
        assert_eq!(state.phase, SyncPhase::Uninitialized);
        assert!(state.vitals.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_platform_disables() {
        let provider = Arc::new(FixtureProvider::default());
        let mut controller = HealthSyncController::new(
            provider.clone(),
            SyncConfig {
                platform: Platform::Android,
                ..Default::default()
            },
        );

        let state = controller.initialize().await;
        assert!(!state.is_available);
        assert!(!state.is_loading);
        assert_eq!(state.phase, SyncPhase::Disabled);
        assert_eq!(provider.authorization_requests(), 0);
    }

    #[tokio::test]
    async fn test_granted_fetches_and_logs() {
        crate::logging::init_test();
        let provider = Arc::new(FixtureProvider::new(FixtureData {
            samples: heart_rate(61.0),
            ..Default::default()
        }));
        let log = create_shared_log();
        let mut controller =
            HealthSyncController::with_transparency_log(provider, ios_config(), log.clone());

        let state = controller.initialize().await;
        assert!(state.is_authorized);
        assert_eq!(state.phase, SyncPhase::Idle);
        assert!(state.last_synced_at.is_some());
        let vitals = state.vitals.unwrap();
        assert_eq!(vitals.get(VitalType::HeartRate).map(|s| s.value), Some(61.0));

        let stats = log.stats().counts;
        assert_eq!(stats.permission_requests, 1);
        assert_eq!(stats.fetch_cycles, 1);
        assert_eq!(stats.vital_samples, 1);
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let provider = Arc::new(FixtureProvider::new(FixtureData {
            samples: heart_rate(61.0),
            ..Default::default()
        }));
        let mut controller = HealthSyncController::new(provider.clone(), ios_config());
        controller.initialize().await;

        provider.update(|d| d.samples = heart_rate(75.0));
        let mut rx = controller.subscribe();
        assert!(controller.refresh().await);
        assert!(rx.has_changed().unwrap());

        let vitals = controller.state().vitals.unwrap();
        assert_eq!(vitals.get(VitalType::HeartRate).map(|s| s.value), Some(75.0));
    }

    #[tokio::test]
    async fn test_drop_marks_torn_down() {
        let provider = Arc::new(FixtureProvider::default());
        let controller = HealthSyncController::new(provider, ios_config());
        let rx = controller.subscribe();
        drop(controller);

        assert_eq!(rx.borrow().phase, SyncPhase::TornDown);
    }
}
