//! Assembles vitals snapshots and workout lists from provider queries.

use crate::core::catalog::{VitalType, WORKOUT_STATISTICS};
use crate::core::normalize::{normalize_vital_sample, normalize_workout};
use crate::core::records::{LatestVitals, WorkoutRecord};
use crate::provider::{HealthProvider, ProviderError};
use futures::future::join_all;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the provider queries of one fetch cycle.
pub struct HealthFetcher<P: HealthProvider> {
    provider: Arc<P>,
}

impl<P: HealthProvider> HealthFetcher<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Query the latest sample of every vital type concurrently.
    ///
    /// A rejected query leaves only its own type empty. All five answers
    /// come from this one call.
    pub async fn fetch_latest_vitals(&self) -> LatestVitals {
        let queries = VitalType::ALL.map(|vital| {
            let provider = &self.provider;
            async move { (vital, provider.latest_sample(vital).await) }
        });

        let mut vitals = LatestVitals::default();
        for (vital, result) in join_all(queries).await {
            let sample = match result {
                Ok(raw) => normalize_vital_sample(vital, raw.as_ref()),
                Err(e) => {
                    warn!(vital = %vital, "Vital query failed: {e}");
                    None
                }
            };
            if sample.is_none() {
                debug!(vital = %vital, "No sample this cycle");
            }
            vitals.set(vital, sample);
        }
        vitals
    }

    /// Query up to `limit` recent workouts with their statistics.
    ///
    /// The list query failing fails the whole call. A statistics query
    /// failing drops calories and distance for that workout only.
    pub async fn fetch_recent_workouts(
        &self,
        limit: usize,
    ) -> Result<Vec<WorkoutRecord>, ProviderError> {
        let mut raw = self.provider.workouts(limit).await?;
        raw.sort_by_key(|w| Reverse(w.start_time.to_datetime()));

        let statistics = join_all(raw.iter().map(|workout| {
            self.provider
                .workout_statistics(&workout.id, &WORKOUT_STATISTICS)
        }))
        .await;

        Ok(raw
            .iter()
            .zip(statistics)
            .map(|(workout, stats)| {
                let stats = stats
                    .map_err(|e| warn!(workout = %workout.id, "Statistics query failed: {e}"))
                    .ok();
                normalize_workout(workout, stats.as_ref())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::StatisticKind;
    use crate::provider::types::{RawQuantity, RawSample, RawStatistic, RawTimestamp, RawWorkout};
    use crate::provider::{FixtureData, FixtureProvider, WorkoutStatistics};
    use std::collections::HashMap;

    fn sample(value: f64) -> RawSample {
        RawSample {
            quantity: Some(value),
            unit: None,
            start_time: RawTimestamp::from("2024-03-05T08:00:00Z"),
            end_time: RawTimestamp::from("2024-03-05T08:00:00Z"),
        }
    }

    fn workout(id: &str, start: &str) -> RawWorkout {
        RawWorkout {
            id: id.to_string(),
            workout_activity_type: 37,
            duration: RawQuantity::new(1800.0, "s"),
            start_time: RawTimestamp::from(start),
            end_time: RawTimestamp::from(start),
            metadata: HashMap::new(),
        }
    }

    fn energy(kcal: f64) -> WorkoutStatistics {
        HashMap::from([(
            StatisticKind::ActiveEnergyBurned.provider_id().to_string(),
            RawStatistic::with_sum(kcal, "kcal"),
        )])
    }

    fn fetcher(data: FixtureData) -> HealthFetcher<FixtureProvider> {
        HealthFetcher::new(Arc::new(FixtureProvider::new(data)))
    }

    #[tokio::test]
    async fn test_one_failing_vital_keeps_the_others() {
        let samples = VitalType::ALL
            .into_iter()
            .map(|v| (v, sample(42.0)))
            .collect();
        let f = fetcher(FixtureData {
            samples,
            failing_vitals: vec![VitalType::HeartRateVariability],
            ..Default::default()
        });

        let vitals = f.fetch_latest_vitals().await;
        assert_eq!(vitals.present_count(), 4);
        assert!(vitals.get(VitalType::HeartRateVariability).is_none());
        assert_eq!(vitals.get(VitalType::StepCount).map(|s| s.unit.as_str()), Some("steps"));
    }

    #[tokio::test]
    async fn test_missing_quantity_is_absent() {
        let mut empty = sample(0.0);
        empty.quantity = None;
        let f = fetcher(FixtureData {
            samples: HashMap::from([(VitalType::HeartRate, empty)]),
            ..Default::default()
        });

        assert!(!f.fetch_latest_vitals().await.has_data());
    }

    #[tokio::test]
    async fn test_workouts_most_recent_first() {
        let f = fetcher(FixtureData {
            workouts: vec![
                workout("a", "2024-03-01T08:00:00Z"),
                workout("c", "2024-03-03T08:00:00Z"),
                workout("b", "2024-03-02T08:00:00Z"),
            ],
            ..Default::default()
        });

        let ids: Vec<String> = f
            .fetch_recent_workouts(10)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_statistics_failure_only_affects_one_workout() {
        let f = fetcher(FixtureData {
            workouts: vec![
                workout("ok", "2024-03-02T08:00:00Z"),
                workout("broken", "2024-03-01T08:00:00Z"),
            ],
            statistics: HashMap::from([
                ("ok".to_string(), energy(300.0)),
                ("broken".to_string(), energy(200.0)),
            ]),
            failing_statistics: vec!["broken".to_string()],
            ..Default::default()
        });

        let workouts = f.fetch_recent_workouts(10).await.unwrap();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].calories_burned, Some(300));
        assert_eq!(workouts[1].calories_burned, None);
        assert_eq!(workouts[1].duration_minutes, 30);
    }

    #[tokio::test]
    async fn test_workout_list_failure_propagates() {
        let f = fetcher(FixtureData {
            fail_workouts: true,
            ..Default::default()
        });
        assert!(f.fetch_recent_workouts(10).await.is_err());
    }
}
