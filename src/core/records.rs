//! Normalized records handed to the rest of the app.

use crate::core::catalog::VitalType;
use serde::{Deserialize, Serialize};

/// One biometric measurement.
///
/// The unit always comes from the catalog entry of `vital_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSample {
    pub vital_type: VitalType,
    pub value: f64,
    pub unit: String,
    /// Sample start (ISO-8601)
    pub start_time: String,
    /// Sample end (ISO-8601)
    pub end_time: String,
}

/// The latest sample of every vital type, taken in a single fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestVitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<VitalSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<VitalSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_variability: Option<VitalSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<VitalSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<VitalSample>,
}

impl LatestVitals {
    /// The sample for one vital type.
    pub fn get(&self, vital: VitalType) -> Option<&VitalSample> {
        self.slot(vital).as_ref()
    }

    /// Replace the sample for one vital type.
    pub fn set(&mut self, vital: VitalType, sample: Option<VitalSample>) {
        *self.slot_mut(vital) = sample;
    }

    /// Iterate over present samples in catalog order.
    pub fn samples(&self) -> impl Iterator<Item = &VitalSample> {
        VitalType::ALL.into_iter().filter_map(|vital| self.get(vital))
    }

    /// Number of vital types with data.
    pub fn present_count(&self) -> usize {
        self.samples().count()
    }

    /// Check if any vital data is present.
    pub fn has_data(&self) -> bool {
        self.present_count() > 0
    }

    fn slot(&self, vital: VitalType) -> &Option<VitalSample> {
        match vital {
            VitalType::HeartRate => &self.heart_rate,
            VitalType::RestingHeartRate => &self.resting_heart_rate,
            VitalType::HeartRateVariability => &self.heart_rate_variability,
            VitalType::RespiratoryRate => &self.respiratory_rate,
            VitalType::StepCount => &self.step_count,
        }
    }

    fn slot_mut(&mut self, vital: VitalType) -> &mut Option<VitalSample> {
        match vital {
            VitalType::HeartRate => &mut self.heart_rate,
            VitalType::RestingHeartRate => &mut self.resting_heart_rate,
            VitalType::HeartRateVariability => &mut self.heart_rate_variability,
            VitalType::RespiratoryRate => &mut self.respiratory_rate,
            VitalType::StepCount => &mut self.step_count,
        }
    }
}

/// A workout as consumed by the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Provider-assigned unique identifier
    pub id: String,
    /// Display label for the activity
    pub activity_type: String,
    /// Raw provider activity-type code
    pub activity_type_code: i64,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Workout start (ISO-8601)
    pub start_time: String,
    /// Workout end (ISO-8601)
    pub end_time: String,
    pub indoor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(vital: VitalType, value: f64) -> VitalSample {
        VitalSample {
            vital_type: vital,
            value,
            unit: vital.unit().to_string(),
            start_time: "2024-03-05T08:00:00.000Z".to_string(),
            end_time: "2024-03-05T08:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_latest_vitals_get_set() {
        let mut vitals = LatestVitals::default();
        assert!(!vitals.has_data());

        vitals.set(VitalType::StepCount, Some(sample(VitalType::StepCount, 4200.0)));
        vitals.set(VitalType::HeartRate, Some(sample(VitalType::HeartRate, 64.0)));

        assert_eq!(vitals.present_count(), 2);
        assert_eq!(vitals.get(VitalType::StepCount).map(|s| s.value), Some(4200.0));
        assert!(vitals.get(VitalType::RespiratoryRate).is_none());

        let order: Vec<VitalType> = vitals.samples().map(|s| s.vital_type).collect();
        assert_eq!(order, vec![VitalType::HeartRate, VitalType::StepCount]);
    }

    #[test]
    fn test_absent_vitals_omitted_from_json() {
        let mut vitals = LatestVitals::default();
        vitals.set(VitalType::HeartRate, Some(sample(VitalType::HeartRate, 70.0)));

        let json = serde_json::to_value(&vitals).unwrap();
        assert!(json.get("heart_rate").is_some());
        assert!(json.get("step_count").is_none());
    }
}
