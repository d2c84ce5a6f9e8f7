//! Transparency log of health-data collection.
//!
//! Tracks how much was read from the provider and when, without storing
//! any of the values themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How one fetch cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The snapshot was replaced with what the cycle read
    Completed { vital_samples: u64, workouts: u64 },
    /// A provider failure discarded the cycle
    Discarded,
}

/// Cumulative collection counts. This is also the persisted form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCounts {
    /// Consent prompts shown
    pub permission_requests: u64,
    /// Fetch cycles that replaced the snapshot
    pub fetch_cycles: u64,
    /// Fetch cycles discarded after a provider failure
    pub failed_cycles: u64,
    /// Vital samples read
    pub vital_samples: u64,
    /// Workouts read
    pub workouts: u64,
}

#[derive(Debug, Default)]
struct Counters {
    permission_requests: AtomicU64,
    fetch_cycles: AtomicU64,
    failed_cycles: AtomicU64,
    vital_samples: AtomicU64,
    workouts: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CollectionCounts {
        CollectionCounts {
            permission_requests: self.permission_requests.load(Ordering::Relaxed),
            fetch_cycles: self.fetch_cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            vital_samples: self.vital_samples.load(Ordering::Relaxed),
            workouts: self.workouts.load(Ordering::Relaxed),
        }
    }

    fn restore(&self, counts: CollectionCounts) {
        self.permission_requests
            .store(counts.permission_requests, Ordering::Relaxed);
        self.fetch_cycles.store(counts.fetch_cycles, Ordering::Relaxed);
        self.failed_cycles.store(counts.failed_cycles, Ordering::Relaxed);
        self.vital_samples.store(counts.vital_samples, Ordering::Relaxed);
        self.workouts.store(counts.workouts, Ordering::Relaxed);
    }
}

/// Collection counters for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    counters: Counters,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            counters: Counters::default(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// A log that resumes from, and saves back to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    pub fn record_permission_request(&self) {
        self.counters
            .permission_requests
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Count one fetch cycle by its outcome.
    pub fn record_cycle(&self, outcome: CycleOutcome) {
        let c = &self.counters;
        match outcome {
            CycleOutcome::Completed {
                vital_samples,
                workouts,
            } => {
                c.fetch_cycles.fetch_add(1, Ordering::Relaxed);
                c.vital_samples.fetch_add(vital_samples, Ordering::Relaxed);
                c.workouts.fetch_add(workouts, Ordering::Relaxed);
            }
            CycleOutcome::Discarded => {
                c.failed_cycles.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            counts: self.counters.snapshot(),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable summary for the CLI.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let counts = stats.counts;
        format!(
            "Session Statistics:\n\
             - Permission requests: {}\n\
             - Fetch cycles: {} ({} discarded)\n\
             - Vital samples read: {}\n\
             - Workouts read: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Read-only access to the health data provider\n\
             - Only five vital types and workouts are read\n\
             - Values stay on this device until you sync them",
            counts.permission_requests,
            counts.fetch_cycles,
            counts.failed_cycles,
            counts.vital_samples,
            counts.workouts,
            stats.session_duration_secs
        )
    }

    /// Write the counts to the persistence path, if any.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let persisted = PersistedStats {
            counts: self.counters.snapshot(),
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let persisted: PersistedStats =
            serde_json::from_str(&content).map_err(std::io::Error::other)?;
        self.counters.restore(persisted.counts);
        Ok(())
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    #[serde(flatten)]
    pub counts: CollectionCounts,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(flatten)]
    counts: CollectionCounts,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(vital_samples: u64, workouts: u64) -> CycleOutcome {
        CycleOutcome::Completed {
            vital_samples,
            workouts,
        }
    }

    #[test]
    fn test_cycle_outcomes_counted() {
        let log = TransparencyLog::new();

        log.record_permission_request();
        log.record_cycle(completed(4, 2));
        log.record_cycle(completed(5, 0));
        log.record_cycle(CycleOutcome::Discarded);

        assert_eq!(
            log.stats().counts,
            CollectionCounts {
                permission_requests: 1,
                fetch_cycles: 2,
                failed_cycles: 1,
                vital_samples: 9,
                workouts: 2,
            }
        );
    }

    #[test]
    fn test_discarded_cycle_reads_nothing() {
        let log = TransparencyLog::new();
        log.record_cycle(CycleOutcome::Discarded);

        let counts = log.stats().counts;
        assert_eq!(counts.fetch_cycles, 0);
        assert_eq!(counts.vital_samples, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transparency.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_cycle(completed(3, 1));
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path);
        assert_eq!(reloaded.stats().counts.fetch_cycles, 1);
        assert_eq!(reloaded.stats().counts.vital_samples, 3);
    }

    #[test]
    fn test_corrupt_persistence_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transparency.json");
        std::fs::write(&path, "not json").unwrap();

        let log = TransparencyLog::with_persistence(path);
        assert_eq!(log.stats().counts, CollectionCounts::default());
    }

    #[test]
    fn test_summary_format() {
        let summary = TransparencyLog::new().summary();

        assert!(summary.contains("Fetch cycles"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("Read-only access"));
    }
}
