//! Health sync: the gate, the fetch cycle, and the controller driving them.

pub mod controller;
pub mod fetcher;
pub mod gateway;
pub mod lifecycle;

// Re-export commonly used types
pub use controller::{
    HealthSyncController, SyncConfig, SyncPhase, SyncState, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_WORKOUT_LIMIT,
};
pub use fetcher::HealthFetcher;
pub use gateway::HealthGateway;
pub use lifecycle::{
    is_foreground_resume, AppState, ForegroundDetector, LifecycleEvents, RefreshSchedule,
    RefreshTrigger,
};
