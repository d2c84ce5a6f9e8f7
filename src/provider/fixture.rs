//! File-backed provider for hosts without a native health-data SDK.
//!
//! A fixture is a JSON document describing what the provider would report:
//! availability, the consent outcome, the latest sample per vital type,
//! workouts and their statistics. It can also inject per-query failures,
//! which makes it the workhorse of the CLI demo and the test suite.

use crate::core::catalog::{ReadScope, StatisticKind, VitalType};
use crate::provider::types::{RawSample, RawWorkout, WorkoutStatistics};
use crate::provider::{HealthProvider, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Serialized fixture contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixtureData {
    /// Whether the provider reports itself available
    pub available: bool,
    /// Outcome of the consent prompt
    pub grant_access: bool,
    /// Latest sample per vital type
    pub samples: HashMap<VitalType, RawSample>,
    /// Workouts, in any order
    pub workouts: Vec<RawWorkout>,
    /// Statistics keyed by workout id
    pub statistics: HashMap<String, WorkoutStatistics>,
    /// Vital types whose query rejects
    pub failing_vitals: Vec<VitalType>,
    /// Whether the workouts query rejects
    pub fail_workouts: bool,
    /// Workout ids whose statistics query rejects
    pub failing_statistics: Vec<String>,
    /// Whether the consent prompt itself rejects
    pub fail_authorization: bool,
}

impl Default for FixtureData {
    fn default() -> Self {
        Self {
            available: true,
            grant_access: true,
            samples: HashMap::new(),
            workouts: Vec::new(),
            statistics: HashMap::new(),
            failing_vitals: Vec::new(),
            fail_workouts: false,
            failing_statistics: Vec::new(),
            fail_authorization: false,
        }
    }
}

/// Errors loading a fixture from disk.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A [`HealthProvider`] answering from an in-memory [`FixtureData`].
#[derive(Debug, Default)]
pub struct FixtureProvider {
    data: RwLock<FixtureData>,
    authorization_requests: AtomicUsize,
    sample_queries: AtomicUsize,
    workout_queries: AtomicUsize,
}

impl FixtureProvider {
    /// Create a provider from fixture data.
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: RwLock::new(data),
            authorization_requests: AtomicUsize::new(0),
            sample_queries: AtomicUsize::new(0),
            workout_queries: AtomicUsize::new(0),
        }
    }

    /// Load a fixture from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        let data: FixtureData = serde_json::from_str(&content)?;
        Ok(Self::new(data))
    }

    /// Mutate the fixture in place, e.g. to add data between fetch cycles.
    pub fn update(&self, f: impl FnOnce(&mut FixtureData)) {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        f(&mut data);
    }

    /// Number of consent prompts shown so far.
    pub fn authorization_requests(&self) -> usize {
        self.authorization_requests.load(Ordering::SeqCst)
    }

    /// Number of latest-sample queries issued so far.
    pub fn sample_queries(&self) -> usize {
        self.sample_queries.load(Ordering::SeqCst)
    }

    /// Number of workout list queries issued so far.
    pub fn workout_queries(&self) -> usize {
        self.workout_queries.load(Ordering::SeqCst)
    }

    fn read<T>(&self, f: impl FnOnce(&FixtureData) -> T) -> T {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        f(&data)
    }
}

#[async_trait]
impl HealthProvider for FixtureProvider {
    fn is_available(&self) -> bool {
        self.read(|d| d.available)
    }

    async fn request_authorization(&self, _scopes: &[ReadScope]) -> Result<bool, ProviderError> {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
        self.read(|d| {
            if d.fail_authorization {
                Err(ProviderError::Query("consent prompt failed".to_string()))
            } else {
                Ok(d.grant_access)
            }
        })
    }

    async fn latest_sample(&self, vital: VitalType) -> Result<Option<RawSample>, ProviderError> {
        self.sample_queries.fetch_add(1, Ordering::SeqCst);
        self.read(|d| {
            if d.failing_vitals.contains(&vital) {
                return Err(ProviderError::Query(format!("{} query rejected", vital.query_id())));
            }
            Ok(d.samples.get(&vital).cloned())
        })
    }

    async fn workouts(&self, limit: usize) -> Result<Vec<RawWorkout>, ProviderError> {
        self.workout_queries.fetch_add(1, Ordering::SeqCst);
        self.read(|d| {
            if d.fail_workouts {
                return Err(ProviderError::Query("workout query rejected".to_string()));
            }
            let mut workouts = d.workouts.clone();
            workouts.sort_by_key(|w| std::cmp::Reverse(w.start_time.to_datetime()));
            workouts.truncate(limit);
            Ok(workouts)
        })
    }

    async fn workout_statistics(
        &self,
        workout_id: &str,
        statistics: &[StatisticKind],
    ) -> Result<WorkoutStatistics, ProviderError> {
        self.read(|d| {
            if d.failing_statistics.iter().any(|id| id == workout_id) {
                return Err(ProviderError::Query(format!(
                    "statistics query for {workout_id} rejected"
                )));
            }
            let Some(all) = d.statistics.get(workout_id) else {
                return Ok(WorkoutStatistics::new());
            };
            Ok(statistics
                .iter()
                .filter_map(|kind| {
                    let id = kind.provider_id();
                    all.get(id).map(|stat| (id.to_string(), stat.clone()))
                })
                .collect())
        })
    }
}
