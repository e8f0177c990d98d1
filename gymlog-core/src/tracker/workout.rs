//! Workout lifecycle: starting, adding exercises and finishing.

use anyhow::Result;
use chrono::Local;
use diesel::Connection;
use log::info;

use crate::catalog::normalize_name;
use crate::db::models::{Workout, WorkoutDetail, WorkoutExercise, WorkoutStatus};
use crate::db::operations::{
    add_workout_exercise, complete_workout, create_workout, get_in_progress_workout,
    load_workout_details,
};
use crate::errors::GymlogError;
use crate::tracker::Tracker;

impl Tracker {
    /// Start a new workout, completing any workout still in progress.
    pub async fn new_workout(&self, notes: &str) -> Result<Workout> {
        let user_id = self.user.id;
        let notes = notes.trim().to_string();

        self.with_conn(move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|conn| {
                if let Some(existing) = get_in_progress_workout(conn, user_id)? {
                    info!("Completing workout {} before starting a new one", existing.id);
                    complete_workout(conn, existing.id)?;
                }
                let workout = create_workout(conn, user_id, &notes, Local::now().naive_local())?;
                info!("Started workout {}", workout.id);
                Ok(workout)
            })
        })
        .await
    }

    /// Append an exercise to the workout in progress, starting a workout
    /// first if there is none. The new entry becomes the active exercise.
    pub async fn begin_exercise(&self, name: &str) -> Result<WorkoutExercise> {
        let name = normalize_name(name)?.to_string();
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let workout = match get_in_progress_workout(conn, user_id)? {
                    Some(workout) => workout,
                    None => {
                        let workout =
                            create_workout(conn, user_id, "", Local::now().naive_local())?;
                        info!("Started workout {}", workout.id);
                        workout
                    }
                };
                add_workout_exercise(conn, workout.id, &name)
            })
        })
        .await
    }

    pub async fn finish_workout(&self) -> Result<Workout> {
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            let mut workout =
                get_in_progress_workout(conn, user_id)?.ok_or(GymlogError::NoActiveWorkout)?;
            complete_workout(conn, workout.id)?;
            info!("Completed workout {}", workout.id);
            workout.status = WorkoutStatus::Completed.as_str().to_string();
            Ok(workout)
        })
        .await
    }

    /// The workout in progress with its exercises and sets, if any.
    pub async fn active_workout(&self) -> Result<Option<WorkoutDetail>> {
        let user_id = self.user.id;

        self.with_conn(move |conn| {
            let Some(workout) = get_in_progress_workout(conn, user_id)? else {
                return Ok(None);
            };
            Ok(load_workout_details(conn, vec![workout])?.pop())
        })
        .await
    }
}
