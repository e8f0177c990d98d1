use anyhow::Result;
use log::info;

use crate::db::models::WorkoutDetail;
use crate::db::operations::{delete_workout, get_workout, list_workouts, load_workout_details};
use crate::tracker::Tracker;

impl Tracker {
    /// Every workout of the user, most recent first.
    pub async fn history(&self) -> Result<Vec<WorkoutDetail>> {
        let user_id = self.user.id;
        self.with_conn(move |conn| {
            let workouts = list_workouts(conn, user_id)?;
            load_workout_details(conn, workouts)
        })
        .await
    }

    pub async fn workout_detail(&self, workout_id: i32) -> Result<Option<WorkoutDetail>> {
        let user_id = self.user.id;
        self.with_conn(move |conn| {
            let Some(workout) = get_workout(conn, user_id, workout_id)? else {
                return Ok(None);
            };
            Ok(load_workout_details(conn, vec![workout])?.pop())
        })
        .await
    }

    /// Returns the number of workouts removed, 0 if the id is not one of the
    /// user's workouts.
    pub async fn delete_workout(&self, workout_id: i32) -> Result<usize> {
        let user_id = self.user.id;
        let deleted = self
            .with_conn(move |conn| delete_workout(conn, user_id, workout_id))
            .await?;
        if deleted > 0 {
            info!("Deleted workout {}", workout_id);
        }
        Ok(deleted)
    }
}
