//! Raw record shapes as returned by the device health-data provider.
//!
//! These mirror the provider's payloads closely and are deliberately loose:
//! quantities may be missing, timestamps may arrive as native dates, epoch
//! milliseconds, or ISO strings. Nothing here is trusted until it has been
//! through [`crate::core::normalize`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Metadata key the provider uses to flag an indoor workout.
pub const INDOOR_WORKOUT_KEY: &str = "HKIndoorWorkout";

/// A timestamp in any of the representations the provider emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Native date object
    Date(DateTime<Utc>),
    /// Milliseconds since the Unix epoch
    Millis(i64),
    /// Free-form text, usually ISO-8601
    Text(String),
}

impl RawTimestamp {
    /// Resolve to a UTC instant, if the representation is parseable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Date(dt) => Some(*dt),
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// ISO-8601 form with millisecond precision and a `Z` suffix.
    ///
    /// Unparseable text is passed through unchanged.
    pub fn to_iso(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
            RawTimestamp::Millis(ms) => write!(f, "{ms}"),
            RawTimestamp::Text(s) => f.write_str(s),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Date(dt)
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(s: String) -> Self {
        RawTimestamp::Text(s)
    }
}

/// A quantity with the provider's unit string attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuantity {
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl RawQuantity {
    pub fn new(quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            quantity,
            unit: unit.into(),
        }
    }
}

/// The most recent sample of a quantity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    /// Sample value; `None` when the provider returned no quantity
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Provider-reported unit, ignored in favour of the catalog unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(alias = "startDate")]
    pub start_time: RawTimestamp,
    #[serde(alias = "endDate")]
    pub end_time: RawTimestamp,
}

/// A workout record as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkout {
    /// Provider-assigned unique identifier
    #[serde(alias = "uuid")]
    pub id: String,
    /// Provider activity-type code
    pub workout_activity_type: i64,
    /// Workout duration, in seconds
    pub duration: RawQuantity,
    #[serde(alias = "startDate")]
    pub start_time: RawTimestamp,
    #[serde(alias = "endDate")]
    pub end_time: RawTimestamp,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RawWorkout {
    /// The indoor-workout metadata flag, accepting booleans and 0/1.
    pub fn indoor_flag(&self) -> Option<bool> {
        match self.metadata.get(INDOOR_WORKOUT_KEY)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            _ => None,
        }
    }
}

/// One summed statistic for a workout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatistic {
    #[serde(default)]
    pub sum: Option<RawQuantity>,
}

impl RawStatistic {
    pub fn with_sum(quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            sum: Some(RawQuantity::new(quantity, unit)),
        }
    }
}

/// Statistics for one workout, keyed by provider statistic identifier.
pub type WorkoutStatistics = HashMap<String, RawStatistic>;
