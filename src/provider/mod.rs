//! Boundary to the device health-data provider.
//!
//! The provider itself (capability query, consent prompt, sample and workout
//! queries) is a black box behind the [`HealthProvider`] trait. Platform
//! detection lives here too, since only one platform ships a provider.

pub mod fixture;
pub mod types;

use crate::core::catalog::{ReadScope, StatisticKind, VitalType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use fixture::{FixtureData, FixtureProvider};
pub use types::{
    RawQuantity, RawSample, RawStatistic, RawTimestamp, RawWorkout, WorkoutStatistics,
};

/// Errors a provider query can reject with.
///
/// Callers treat every variant as "no data this cycle", never as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider is not present on this device
    #[error("health data provider is unavailable")]
    Unavailable,

    /// The query was rejected because read access was not granted
    #[error("read access not granted for {0}")]
    NotAuthorized(String),

    /// The provider failed to answer the query
    #[error("provider query failed: {0}")]
    Query(String),
}

/// The external health-data source.
///
/// Implementations wrap the platform SDK. Every async method may reject;
/// the sync layer isolates those failures.
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// Whether the provider is present and usable on this device.
    ///
    /// Must be cheap and side-effect free.
    fn is_available(&self) -> bool;

    /// Show the consent prompt for the given read scopes.
    ///
    /// Resolves to `Ok(false)` when the user declines.
    async fn request_authorization(&self, scopes: &[ReadScope]) -> Result<bool, ProviderError>;

    /// The most recent sample for a vital type, if one exists.
    async fn latest_sample(&self, vital: VitalType) -> Result<Option<RawSample>, ProviderError>;

    /// Up to `limit` workouts, most recent first.
    async fn workouts(&self, limit: usize) -> Result<Vec<RawWorkout>, ProviderError>;

    /// Summed statistics for one workout.
    async fn workout_statistics(
        &self,
        workout_id: &str,
        statistics: &[StatisticKind],
    ) -> Result<WorkoutStatistics, ProviderError>;
}

/// Host platforms the client can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    Android,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else {
            Platform::Other
        }
    }

    /// Only iOS ships the health-data provider.
    pub fn supports_health_data(self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
            Platform::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "other" => Ok(Platform::Other),
            other => Err(format!("unknown platform '{other}' (expected ios, android or other)")),
        }
    }
}
