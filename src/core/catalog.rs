//! Static catalog of the vital types and workout statistics we consume.
//!
//! Every vital type resolves to exactly one display unit and one provider
//! query identifier. The mapping is an exhaustive `match`, so there is no
//! runtime fallback for an unknown vital type: adding a variant without a
//! catalog entry does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label used for any workout activity code the catalog does not know.
pub const FALLBACK_ACTIVITY_LABEL: &str = "Other";

/// The five biometric measurement kinds pulled from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VitalType {
    HeartRate,
    RestingHeartRate,
    HeartRateVariability,
    RespiratoryRate,
    StepCount,
}

impl VitalType {
    /// All vital types, in the order they are queried and reported.
    pub const ALL: [VitalType; 5] = [
        VitalType::HeartRate,
        VitalType::RestingHeartRate,
        VitalType::HeartRateVariability,
        VitalType::RespiratoryRate,
        VitalType::StepCount,
    ];

    /// Stable camelCase identifier, matching the serialized form.
    pub fn id(self) -> &'static str {
        match self {
            VitalType::HeartRate => "heartRate",
            VitalType::RestingHeartRate => "restingHeartRate",
            VitalType::HeartRateVariability => "heartRateVariability",
            VitalType::RespiratoryRate => "respiratoryRate",
            VitalType::StepCount => "stepCount",
        }
    }

    /// Canonical display unit for this vital type.
    pub fn unit(self) -> &'static str {
        match self {
            VitalType::HeartRate => "bpm",
            VitalType::RestingHeartRate => "bpm",
            VitalType::HeartRateVariability => "ms",
            VitalType::RespiratoryRate => "breaths/min",
            VitalType::StepCount => "steps",
        }
    }

    /// Provider quantity-type identifier used to query the latest sample.
    pub fn query_id(self) -> &'static str {
        match self {
            VitalType::HeartRate => "HKQuantityTypeIdentifierHeartRate",
            VitalType::RestingHeartRate => "HKQuantityTypeIdentifierRestingHeartRate",
            VitalType::HeartRateVariability => "HKQuantityTypeIdentifierHeartRateVariabilitySDNN",
            VitalType::RespiratoryRate => "HKQuantityTypeIdentifierRespiratoryRate",
            VitalType::StepCount => "HKQuantityTypeIdentifierStepCount",
        }
    }

    /// Key written to the `data_type` column of persisted health data rows.
    pub fn data_type(self) -> &'static str {
        match self {
            VitalType::HeartRate => "heart_rate",
            VitalType::RestingHeartRate => "resting_heart_rate",
            VitalType::HeartRateVariability => "heart_rate_variability",
            VitalType::RespiratoryRate => "respiratory_rate",
            VitalType::StepCount => "step_count",
        }
    }
}

impl fmt::Display for VitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_type())
    }
}

/// Error returned when parsing an unknown vital type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vital type: {0}")]
pub struct UnknownVitalType(pub String);

impl FromStr for VitalType {
    type Err = UnknownVitalType;

    /// Accepts either the persistence key (`heart_rate`) or the camelCase
    /// identifier (`heartRate`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VitalType::ALL
            .into_iter()
            .find(|t| t.data_type() == s || t.id() == s)
            .ok_or_else(|| UnknownVitalType(s.to_string()))
    }
}

/// Auxiliary per-workout statistics summed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatisticKind {
    ActiveEnergyBurned,
    DistanceWalkingRunning,
    DistanceCycling,
    DistanceSwimming,
}

impl StatisticKind {
    /// Provider identifier, also the key of the statistics map it returns.
    pub fn provider_id(self) -> &'static str {
        match self {
            StatisticKind::ActiveEnergyBurned => "HKQuantityTypeIdentifierActiveEnergyBurned",
            StatisticKind::DistanceWalkingRunning => {
                "HKQuantityTypeIdentifierDistanceWalkingRunning"
            }
            StatisticKind::DistanceCycling => "HKQuantityTypeIdentifierDistanceCycling",
            StatisticKind::DistanceSwimming => "HKQuantityTypeIdentifierDistanceSwimming",
        }
    }
}

/// Distance statistics in the order they are tried for a workout.
pub const DISTANCE_PRIORITY: [StatisticKind; 3] = [
    StatisticKind::DistanceWalkingRunning,
    StatisticKind::DistanceCycling,
    StatisticKind::DistanceSwimming,
];

/// Every statistic requested for each workout.
pub const WORKOUT_STATISTICS: [StatisticKind; 4] = [
    StatisticKind::ActiveEnergyBurned,
    StatisticKind::DistanceWalkingRunning,
    StatisticKind::DistanceCycling,
    StatisticKind::DistanceSwimming,
];

/// A read permission requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadScope {
    Vital(VitalType),
    Workouts,
}

impl ReadScope {
    pub fn provider_id(self) -> &'static str {
        match self {
            ReadScope::Vital(vital) => vital.query_id(),
            ReadScope::Workouts => "HKWorkoutTypeIdentifier",
        }
    }
}

/// The read scopes needed by this layer: the five vitals plus workouts.
pub fn all_read_scopes() -> Vec<ReadScope> {
    VitalType::ALL
        .into_iter()
        .map(ReadScope::Vital)
        .chain(std::iter::once(ReadScope::Workouts))
        .collect()
}

/// Human-readable label for a provider workout activity-type code.
///
/// Unknown codes map to [`FALLBACK_ACTIVITY_LABEL`].
pub fn activity_label(code: i64) -> &'static str {
    match code {
        1 => "American Football",
        4 => "Badminton",
        5 => "Baseball",
        6 => "Basketball",
        8 => "Boxing",
        9 => "Climbing",
        11 => "Cross Training",
        13 => "Cycling",
        14 => "Dance",
        16 => "Elliptical",
        20 => "Functional Strength Training",
        21 => "Golf",
        24 => "Hiking",
        25 => "Hockey",
        28 => "Martial Arts",
        29 => "Mind and Body",
        33 => "Preparation and Recovery",
        35 => "Rowing",
        37 => "Running",
        41 => "Soccer",
        44 => "Stair Climbing",
        46 => "Swimming",
        48 => "Tennis",
        50 => "Strength Training",
        51 => "Volleyball",
        52 => "Walking",
        53 => "Water Fitness",
        57 => "Yoga",
        58 => "Barre",
        59 => "Core Training",
        60 => "Cross Country Skiing",
        61 => "Downhill Skiing",
        62 => "Flexibility",
        63 => "HIIT",
        64 => "Jump Rope",
        66 => "Pilates",
        67 => "Snowboarding",
        72 => "Tai Chi",
        73 => "Mixed Cardio",
        77 => "Cardio Dance",
        79 => "Pickleball",
        80 => "Cooldown",
        _ => FALLBACK_ACTIVITY_LABEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_vital_has_unit_and_query_id() {
        for vital in VitalType::ALL {
            assert!(!vital.unit().is_empty());
            assert!(vital.query_id().starts_with("HKQuantityTypeIdentifier"));
        }
    }

    #[test]
    fn test_vital_units() {
        assert_eq!(VitalType::HeartRate.unit(), "bpm");
        assert_eq!(VitalType::HeartRateVariability.unit(), "ms");
        assert_eq!(VitalType::RespiratoryRate.unit(), "breaths/min");
        assert_eq!(VitalType::StepCount.unit(), "steps");
    }

    #[test]
    fn test_vital_type_parsing() {
        assert_eq!("heart_rate".parse(), Ok(VitalType::HeartRate));
        assert_eq!("heartRateVariability".parse(), Ok(VitalType::HeartRateVariability));
        assert!("blood_pressure".parse::<VitalType>().is_err());
    }

    #[test]
    fn test_activity_label_known_and_unknown() {
        assert_eq!(activity_label(37), "Running");
        assert_eq!(activity_label(13), "Cycling");
        assert_eq!(activity_label(9999), FALLBACK_ACTIVITY_LABEL);
        assert_eq!(activity_label(-1), "Other");
    }

    #[test]
    fn test_read_scopes_cover_vitals_and_workouts() {
        let scopes = all_read_scopes();
        assert_eq!(scopes.len(), 6);
        assert!(scopes.contains(&ReadScope::Workouts));
        assert!(scopes.contains(&ReadScope::Vital(VitalType::StepCount)));
    }

    #[test]
    fn test_distance_priority_order() {
        assert_eq!(
            DISTANCE_PRIORITY,
            [
                StatisticKind::DistanceWalkingRunning,
                StatisticKind::DistanceCycling,
                StatisticKind::DistanceSwimming,
            ]
        );
    }
}
