//! health-sync - Health-data acquisition and normalization.
//!
//! This library reads biometric data (heart rate, resting heart rate, HRV,
//! respiratory rate, step count) and workouts from a device health-data
//! provider, normalizes them into stable records, and keeps them fresh on a
//! schedule and whenever the app returns to the foreground.
//!
//! # Privacy Guarantees
//!
//! - **Read-only**: We only ever request read access, never write
//! - **Minimal scope**: Only five vital types and workouts are requested
//! - **Consent first**: Nothing is read until the user grants access
//! - **Transparency**: All collection is logged and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HealthSyncController                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Gateway   │──▶│   Fetcher   │──▶│ Normalizer  │        │
//! │  │(avail/auth) │   │  (queries)  │   │   (pure)    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                 │                 │               │
//! │         ▼                 ▼                 ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Provider   │   │  Schedule   │   │  SyncState  │        │
//! │  │   (trait)   │   │(timer, app) │   │   (watch)   │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use health_sync::provider::{FixtureData, FixtureProvider, Platform};
//! use health_sync::sync::{HealthSyncController, LifecycleEvents, SyncConfig};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let provider = Arc::new(FixtureProvider::new(FixtureData::default()));
//! let config = SyncConfig {
//!     platform: Platform::Ios,
//!     ..Default::default()
//! };
//! let mut controller = HealthSyncController::new(provider, config);
//!
//! let lifecycle = LifecycleEvents::new();
//! controller.mount(&lifecycle).await;
//! println!("{:?}", controller.state().vitals);
//! controller.unmount().await;
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod export;
pub mod logging;
pub mod provider;
pub mod sync;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{LatestVitals, VitalSample, VitalType, WorkoutRecord};
pub use export::{ActivityRow, ExportBatch, ExportFormat, HealthDataRow};
pub use provider::{HealthProvider, Platform, ProviderError};
pub use sync::{AppState, HealthSyncController, LifecycleEvents, SyncConfig, SyncPhase, SyncState};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

// Backend re-exports (when enabled)
#[cfg(feature = "backend")]
pub use backend::BackendClient;
pub use backend::{BackendConfig, BackendError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║               HEALTH SYNC - PRIVACY DECLARATION                  ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This app reads health data to enrich your symptom log.          ║
║                                                                  ║
║  ✓ WHAT WE READ (only after you grant access):                   ║
║    • Heart rate and resting heart rate                           ║
║    • Heart rate variability                                      ║
║    • Respiratory rate                                            ║
║    • Step count                                                  ║
║    • Workouts (type, duration, energy, distance)                 ║
║                                                                  ║
║  ✗ WHAT WE NEVER DO:                                             ║
║    • Write to or modify your health records                      ║
║    • Read any other health data type                             ║
║    • Ask again after you decline                                 ║
║                                                                  ║
║  Data is refreshed every 5 minutes while the app is open,        ║
║  and stays on this device until you sync it.                     ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    health-sync status                                            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
