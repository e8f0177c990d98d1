use anyhow::Result;

use crate::db::DbPool;
use crate::db::operations::{logged_exercise_names, sessions_for_exercise};
use crate::metrics::{
    ExerciseSession, MetricKey, MetricPoint, SessionSource, Summary, load_series, summarize,
};
use crate::tracker::Tracker;

/// Sessions of one user, read straight from the database.
#[derive(Clone)]
pub struct UserSessions {
    pool: DbPool,
    user_id: i32,
}

impl UserSessions {
    pub fn new(pool: DbPool, user_id: i32) -> Self {
        Self { pool, user_id }
    }
}

impl SessionSource for UserSessions {
    fn sessions_for_exercise(&self, name: &str) -> Result<Vec<ExerciseSession>> {
        let mut conn = self.pool.get()?;
        sessions_for_exercise(&mut conn, self.user_id, name)
    }
}

impl Tracker {
    pub fn sessions(&self) -> UserSessions {
        UserSessions::new(self.pool.clone(), self.user.id)
    }

    /// Distinct names of every exercise the user has logged, sorted.
    pub async fn logged_exercise_names(&self) -> Result<Vec<String>> {
        let user_id = self.user.id;
        self.with_conn(move |conn| logged_exercise_names(conn, user_id))
            .await
    }

    /// One metric point per workout that logged `name`, oldest first.
    pub async fn progression(&self, name: &str) -> Result<Vec<MetricPoint>> {
        let source = self.sessions();
        let name = name.to_string();
        let config = self.aggregator;

        tokio::task::spawn_blocking(move || load_series(&source, &name, &config)).await?
    }

    pub async fn progression_summary(&self, name: &str, key: MetricKey) -> Result<Summary> {
        let series = self.progression(name).await?;
        Ok(summarize(&series, key))
    }
}
