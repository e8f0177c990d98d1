use anyhow::Result;
use diesel::SqliteConnection;
use log::debug;

use crate::db::models::{WorkoutExercise, WorkoutSet};
use crate::db::operations::{
    add_workout_set, get_in_progress_workout, get_last_set, get_last_workout_exercise,
    get_sets_for_exercise, update_rest_seconds,
};
use crate::errors::GymlogError;
use crate::tracker::Tracker;

fn active_exercise(conn: &mut SqliteConnection, user_id: i32) -> Result<WorkoutExercise> {
    let workout = get_in_progress_workout(conn, user_id)?.ok_or(GymlogError::NoActiveWorkout)?;
    let exercise =
        get_last_workout_exercise(conn, workout.id)?.ok_or(GymlogError::NoActiveExercise)?;
    Ok(exercise)
}

impl Tracker {
    /// Record a set on the active exercise. The set is numbered after the
    /// sets already recorded for that exercise and starts with no rest.
    pub async fn add_set(&self, weight: f64, reps: i64) -> Result<WorkoutSet> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GymlogError::InvalidWeight(weight).into());
        }
        let reps = i32::try_from(reps)
            .ok()
            .filter(|r| *r >= 0)
            .ok_or(GymlogError::InvalidReps(reps))?;
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            let exercise = active_exercise(conn, user_id)?;
            let set = add_workout_set(conn, exercise.id, weight, reps)?;
            debug!("Added set {} to {}", set.set_index, exercise.name);
            Ok(set)
        })
        .await
    }

    /// Record the rest taken after the most recent set of the active exercise.
    /// Each set takes its rest once.
    pub async fn record_rest(&self, seconds: i64) -> Result<WorkoutSet> {
        let seconds = i32::try_from(seconds)
            .ok()
            .filter(|s| *s >= 0)
            .ok_or(GymlogError::InvalidRest(seconds))?;
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            let exercise = active_exercise(conn, user_id)?;
            let last = get_last_set(conn, exercise.id)?
                .ok_or_else(|| GymlogError::NoSetsRecorded(exercise.name.clone()))?;
            let set = update_rest_seconds(conn, last.id, seconds)?
                .ok_or(GymlogError::RestAlreadyRecorded(last.set_index))?;
            Ok(set)
        })
        .await
    }

    /// The active exercise with the sets recorded so far.
    pub async fn current_exercise(&self) -> Result<(WorkoutExercise, Vec<WorkoutSet>)> {
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            let exercise = active_exercise(conn, user_id)?;
            let sets = get_sets_for_exercise(conn, exercise.id)?;
            Ok((exercise, sets))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::GymlogError;
    use crate::tracker::Tracker;

    fn kind(err: &anyhow::Error) -> Option<&GymlogError> {
        err.downcast_ref::<GymlogError>()
    }

    #[tokio::test]
    async fn sets_are_numbered_per_exercise() {
        let tracker = Tracker::in_memory("anna").await.unwrap();
        tracker.begin_exercise("Bench Press").await.unwrap();
        let first = tracker.add_set(40.0, 10).await.unwrap();
        let second = tracker.add_set(40.0, 8).await.unwrap();
        assert_eq!((first.set_index, second.set_index), (1, 2));

        tracker.begin_exercise("Squat").await.unwrap();
        let squat = tracker.add_set(80.0, 5).await.unwrap();
        assert_eq!(squat.set_index, 1);

        let (exercise, sets) = tracker.current_exercise().await.unwrap();
        assert_eq!(exercise.name, "Squat");
        assert_eq!(sets, vec![squat]);
    }

    #[tokio::test]
    async fn rest_updates_the_latest_set() {
        let tracker = Tracker::in_memory("anna").await.unwrap();
        tracker.begin_exercise("Row").await.unwrap();

        let err = tracker.record_rest(60).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::NoSetsRecorded("Row".into())));

        tracker.add_set(50.0, 12).await.unwrap();
        let second = tracker.add_set(50.0, 10).await.unwrap();
        let rested = tracker.record_rest(90).await.unwrap();
        assert_eq!(rested.id, second.id);
        assert_eq!(rested.rest_seconds, 90);
        assert_eq!(rested.to_string(), "Set 2 — 50kg × 10 reps | ⏱ 90s");

        let (_, sets) = tracker.current_exercise().await.unwrap();
        assert_eq!(sets[0].rest_seconds, 0);
        assert_eq!(sets[0].to_string(), "Set 1 — 50kg × 12 reps");
    }

    #[tokio::test]
    async fn rest_is_recorded_once_per_set() {
        let tracker = Tracker::in_memory("anna").await.unwrap();
        tracker.begin_exercise("Row").await.unwrap();
        tracker.add_set(50.0, 10).await.unwrap();

        assert_eq!(tracker.record_rest(90).await.unwrap().rest_seconds, 90);
        let err = tracker.record_rest(300).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::RestAlreadyRecorded(1)));

        let (_, sets) = tracker.current_exercise().await.unwrap();
        assert_eq!(sets[0].rest_seconds, 90);

        tracker.add_set(50.0, 8).await.unwrap();
        assert_eq!(tracker.record_rest(0).await.unwrap().set_index, 2);
        let err = tracker.record_rest(60).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::RestAlreadyRecorded(2)));
    }

    #[tokio::test]
    async fn invalid_numbers_are_rejected() {
        let tracker = Tracker::in_memory("anna").await.unwrap();
        tracker.begin_exercise("Curl").await.unwrap();

        let err = tracker.add_set(-1.0, 10).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::InvalidWeight(-1.0)));
        let err = tracker.add_set(f64::NAN, 10).await.unwrap_err();
        assert!(matches!(kind(&err), Some(GymlogError::InvalidWeight(_))));
        let err = tracker.add_set(10.0, -3).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::InvalidReps(-3)));
        let err = tracker.record_rest(-30).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::InvalidRest(-30)));

        let (_, sets) = tracker.current_exercise().await.unwrap();
        assert!(sets.is_empty());
    }

    #[tokio::test]
    async fn sets_need_an_exercise() {
        let tracker = Tracker::in_memory("anna").await.unwrap();
        let err = tracker.add_set(20.0, 10).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::NoActiveWorkout));

        tracker.new_workout("").await.unwrap();
        let err = tracker.add_set(20.0, 10).await.unwrap_err();
        assert_eq!(kind(&err), Some(&GymlogError::NoActiveExercise));
    }
}
