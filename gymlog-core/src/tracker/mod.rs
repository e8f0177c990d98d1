//! The `Tracker` ties one user to a database and exposes the workout logging,
//! history, catalog and analytics operations.
//!
//! Every storage call runs on tokio's blocking pool against a pooled SQLite
//! connection, so callers only ever see async methods.

mod analytics;
mod catalog;
mod history;
mod sets;
mod workout;

pub use analytics::UserSessions;

use anyhow::Result;
use diesel::SqliteConnection;
use log::info;

use crate::config::Config;
use crate::db::{self, DbPool, models::User, operations::get_or_create_user};
use crate::metrics::AggregatorConfig;

pub struct Tracker {
    pool: DbPool,
    user: User,
    aggregator: AggregatorConfig,
}

impl Tracker {
    pub async fn open(config: &Config) -> Result<Self> {
        Self::open_with(&config.database_url, &config.username, config.aggregator).await
    }

    pub async fn open_with(
        database_url: &str,
        username: &str,
        aggregator: AggregatorConfig,
    ) -> Result<Self> {
        let database_url = database_url.to_string();
        let username = username.to_string();

        let (pool, user) = tokio::task::spawn_blocking(move || {
            let pool = db::open_pool(&database_url)?;
            let user = get_or_create_user(&mut *pool.get()?, &username)?;
            Ok::<_, anyhow::Error>((pool, user))
        })
        .await??;

        info!("Opened tracker for user {} (id {})", user.username, user.id);
        Ok(Self {
            pool,
            user,
            aggregator,
        })
    }

    /// An in-memory tracker, mostly useful for tests.
    pub async fn in_memory(username: &str) -> Result<Self> {
        Self::open_with(db::MEMORY_DATABASE_URL, username, AggregatorConfig::default()).await
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn aggregator_config(&self) -> &AggregatorConfig {
        &self.aggregator
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }
}
