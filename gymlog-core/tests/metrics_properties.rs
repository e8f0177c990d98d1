use chrono::{Duration, NaiveDate, NaiveDateTime};
use gymlog::metrics::{
    AggregatorConfig, ExerciseSession, MetricKey, SetRecord, compute_series, round_to, summarize,
};
use proptest::prelude::*;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap()
}

// Weights in 0.5 kg steps, like plates on a bar.
fn set_strategy() -> impl Strategy<Value = SetRecord> {
    (0u32..=600, 0u32..=30).prop_map(|(half_kg, reps)| SetRecord::new(f64::from(half_kg) / 2.0, reps))
}

fn sessions_strategy() -> impl Strategy<Value = Vec<ExerciseSession>> {
    prop::collection::vec(prop::collection::vec(set_strategy(), 0..8), 0..12).prop_map(|days| {
        days.into_iter()
            .enumerate()
            .map(|(i, sets)| ExerciseSession::new(start() + Duration::days(i as i64 * 3), sets))
            .collect()
    })
}

proptest! {
    #[test]
    fn one_point_per_non_empty_session(sessions in sessions_strategy()) {
        let series = compute_series(&sessions, &AggregatorConfig::default());
        let non_empty: Vec<&ExerciseSession> = sessions.iter().filter(|s| !s.sets.is_empty()).collect();
        prop_assert_eq!(series.len(), non_empty.len());
        for (point, session) in series.iter().zip(non_empty) {
            prop_assert_eq!(point.date, session.date);
            prop_assert_eq!(point.set_count, session.sets.len());
        }
    }

    #[test]
    fn volume_is_the_rounded_sum_of_work(sessions in sessions_strategy()) {
        let series = compute_series(&sessions, &AggregatorConfig::default());
        let non_empty = sessions.iter().filter(|s| !s.sets.is_empty());
        for (point, session) in series.iter().zip(non_empty) {
            let work: f64 = session.sets.iter().map(|s| s.weight_kg * f64::from(s.repetitions)).sum();
            prop_assert_eq!(point.volume, round_to(work, 0));
        }
    }

    #[test]
    fn max_weight_is_a_recorded_weight(sessions in sessions_strategy()) {
        let series = compute_series(&sessions, &AggregatorConfig::default());
        let non_empty = sessions.iter().filter(|s| !s.sets.is_empty());
        for (point, session) in series.iter().zip(non_empty) {
            prop_assert!(session.sets.iter().any(|s| s.weight_kg == point.max_weight));
            prop_assert!(session.sets.iter().all(|s| s.weight_kg <= point.max_weight));
        }
    }

    #[test]
    fn estimate_never_below_max_weight(sessions in sessions_strategy()) {
        let series = compute_series(&sessions, &AggregatorConfig::default());
        for point in &series {
            prop_assert!(point.estimated_one_rep_max >= point.max_weight);
        }
    }

    #[test]
    fn summarize_is_idempotent(sessions in sessions_strategy(), key_idx in 0usize..4) {
        let key = MetricKey::ALL[key_idx];
        let series = compute_series(&sessions, &AggregatorConfig::default());
        let first = summarize(&series, key);
        let second = summarize(&series, key);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.count, series.len());
        if let Some(record) = first.record {
            prop_assert!(record >= first.latest);
        } else {
            prop_assert!(series.is_empty());
        }
    }
}
