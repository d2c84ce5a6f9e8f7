//! Pure conversions from raw provider records to normalized records.
//!
//! Nothing in here performs I/O or keeps state. Malformed input degrades to
//! absence for the affected record or field, never to an error.

use crate::core::catalog::{activity_label, StatisticKind, VitalType, DISTANCE_PRIORITY};
use crate::core::records::{VitalSample, WorkoutRecord};
use crate::provider::types::{RawSample, RawTimestamp, RawWorkout, WorkoutStatistics};

const SECONDS_PER_MINUTE: f64 = 60.0;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Convert one raw sample into a [`VitalSample`].
///
/// Returns `None` when the sample is missing or carries no quantity. The
/// unit is taken from the catalog; any unit on the raw sample is ignored.
pub fn normalize_vital_sample(vital: VitalType, raw: Option<&RawSample>) -> Option<VitalSample> {
    let raw = raw?;
    let value = raw.quantity.filter(|v| v.is_finite())?;

    Some(VitalSample {
        vital_type: vital,
        value,
        unit: vital.unit().to_string(),
        start_time: raw.start_time.to_iso(),
        end_time: raw.end_time.to_iso(),
    })
}

/// Calendar day (`YYYY-MM-DD`) of a timestamp, on the UTC day boundary.
///
/// Total: text that does not parse as an instant is truncated at its first
/// `T`, the same way an ISO-8601 instant is cut down to its date. Epoch
/// milliseconds outside chrono's range have no date and come back as the
/// digit string, matching [`RawTimestamp::to_iso`].
pub fn calendar_date(timestamp: &RawTimestamp) -> String {
    match timestamp.to_datetime() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            let text = timestamp.to_string();
            text.split('T').next().unwrap_or_default().to_string()
        }
    }
}

/// Convert a raw workout and its statistics into a [`WorkoutRecord`].
pub fn normalize_workout(raw: &RawWorkout, statistics: Option<&WorkoutStatistics>) -> WorkoutRecord {
    let calories_burned = statistics
        .and_then(|stats| statistic_sum(stats, StatisticKind::ActiveEnergyBurned))
        .map(|kcal| kcal.round() as i64);

    let distance_km = statistics.and_then(distance_meters).map(meters_to_km);

    WorkoutRecord {
        id: raw.id.clone(),
        activity_type: activity_label(raw.workout_activity_type).to_string(),
        activity_type_code: raw.workout_activity_type,
        duration_minutes: duration_minutes(raw.duration.quantity),
        calories_burned,
        distance_km,
        start_time: raw.start_time.to_iso(),
        end_time: raw.end_time.to_iso(),
        indoor: raw.indoor_flag().unwrap_or(false),
    }
}

/// Whole minutes for a duration in seconds, rounding half away from zero.
///
/// Negative or non-finite durations clamp to zero.
pub fn duration_minutes(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds / SECONDS_PER_MINUTE).round() as u32
}

/// Kilometres rounded to two decimal places.
pub fn meters_to_km(meters: f64) -> f64 {
    (meters / METERS_PER_KILOMETER * 100.0).round() / 100.0
}

/// The summed quantity of one statistic. Zero and missing sums are both
/// treated as no data.
fn statistic_sum(stats: &WorkoutStatistics, kind: StatisticKind) -> Option<f64> {
    stats
        .get(kind.provider_id())
        .and_then(|stat| stat.sum.as_ref())
        .map(|sum| sum.quantity)
        .filter(|q| q.is_finite() && *q != 0.0)
}

/// First distance statistic with data, in priority order.
fn distance_meters(stats: &WorkoutStatistics) -> Option<f64> {
    DISTANCE_PRIORITY
        .iter()
        .find_map(|kind| statistic_sum(stats, *kind))
}
