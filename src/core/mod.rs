//! Core data model for health-data acquisition.
//!
//! This module contains:
//! - The static catalog of vital types, units and workout statistics
//! - Normalized record types
//! - Pure normalization from raw provider records

pub mod catalog;
pub mod normalize;
pub mod records;

// Re-export commonly used types
pub use catalog::{activity_label, all_read_scopes, ReadScope, StatisticKind, VitalType};
pub use normalize::{calendar_date, normalize_vital_sample, normalize_workout};
pub use records::{LatestVitals, VitalSample, WorkoutRecord};
