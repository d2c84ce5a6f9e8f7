//! Persistence rows derived from a sync snapshot.
//!
//! A downstream writer stores vitals as `HealthData` rows and workouts as
//! `Activity` rows. This module only produces the rows; it never writes to
//! the backend store itself.

use crate::core::normalize::calendar_date;
use crate::core::records::{VitalSample, WorkoutRecord};
use crate::provider::RawTimestamp;
use crate::sync::SyncState;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One stored biometric measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDataRow {
    /// Persistence key, e.g. `heart_rate`
    pub data_type: String,
    pub value: f64,
    pub unit: String,
    /// When the measurement was taken (sample end, ISO-8601)
    pub recorded_at: String,
}

impl From<&VitalSample> for HealthDataRow {
    fn from(sample: &VitalSample) -> Self {
        Self {
            data_type: sample.vital_type.data_type().to_string(),
            value: sample.value,
            unit: sample.unit.clone(),
            recorded_at: sample.end_time.clone(),
        }
    }
}

/// One activity log entry derived from a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    /// Provider workout id, used to avoid duplicate rows
    pub source_id: String,
    pub activity_type: String,
    pub activity_type_code: i64,
    /// Calendar day of the workout start (`YYYY-MM-DD`, UTC)
    pub date: String,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub started_at: String,
    pub ended_at: String,
    pub indoor: bool,
}

impl From<&WorkoutRecord> for ActivityRow {
    fn from(workout: &WorkoutRecord) -> Self {
        Self {
            source_id: workout.id.clone(),
            activity_type: workout.activity_type.clone(),
            activity_type_code: workout.activity_type_code,
            date: calendar_date(&RawTimestamp::from(workout.start_time.as_str())),
            duration_minutes: workout.duration_minutes,
            calories_burned: workout.calories_burned,
            distance_km: workout.distance_km,
            started_at: workout.start_time.clone(),
            ended_at: workout.end_time.clone(),
            indoor: workout.indoor,
        }
    }
}

/// All rows produced from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportBatch {
    pub health_data: Vec<HealthDataRow>,
    pub activities: Vec<ActivityRow>,
}

impl ExportBatch {
    /// Build rows from the current state. Absent vitals produce no row.
    pub fn from_state(state: &SyncState) -> Self {
        let health_data = state
            .vitals
            .iter()
            .flat_map(|vitals| vitals.samples())
            .map(HealthDataRow::from)
            .collect();
        let activities = state.workouts.iter().map(ActivityRow::from).collect();

        Self {
            health_data,
            activities,
        }
    }

    pub fn len(&self) -> usize {
        self.health_data.len() + self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the batch in the requested format.
    pub fn render(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Jsonl => {
                let mut out = String::new();
                for row in self.rows() {
                    out.push_str(&serde_json::to_string(&row)?);
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }

    /// Render and write the batch, creating parent directories as needed.
    pub fn write_to(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(format)?)?;
        Ok(())
    }

    fn rows(&self) -> impl Iterator<Item = ExportRow<'_>> {
        self.health_data
            .iter()
            .map(ExportRow::HealthData)
            .chain(self.activities.iter().map(ExportRow::Activity))
    }
}

/// A single tagged row for line-delimited output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ExportRow<'a> {
    HealthData(&'a HealthDataRow),
    Activity(&'a ActivityRow),
}

/// Output format for exported rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// One JSON document with both row lists
    #[default]
    Json,
    /// One tagged row per line
    Jsonl,
}

/// Export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
