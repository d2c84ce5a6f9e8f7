//! Transparency module for health-data collection.
//!
//! This module tracks what the sync layer reads from the provider,
//! supporting user trust and auditability.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, CollectionCounts, CycleOutcome,
    SharedTransparencyLog, TransparencyLog, TransparencyStats,
};
