pub mod models;
pub mod operations;
pub mod schema;

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MEMORY_DATABASE_URL: &str = ":memory:";

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    enable_wal: bool,
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        );
        if self.enable_wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn is_memory_url(database_url: &str) -> bool {
    database_url == MEMORY_DATABASE_URL || database_url.starts_with("file::memory:")
}

/// Opens a pool for `database_url` and brings the schema up to date.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
pub fn open_pool(database_url: &str) -> Result<DbPool> {
    let in_memory = is_memory_url(database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let options = ConnectionOptions {
        enable_wal: !in_memory,
        busy_timeout_ms: 5000,
    };

    let builder = Pool::builder().connection_customizer(Box::new(options));
    let builder = if in_memory {
        builder
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        builder.max_size(4)
    };

    debug!("Opening database pool for {}", database_url);
    let pool = builder
        .build(manager)
        .with_context(|| format!("Failed to create DB pool for {}", database_url))?;

    let mut conn = pool.get()?;
    init_database(&mut conn)?;
    Ok(pool)
}

pub fn init_database(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    if applied.is_empty() {
        debug!("No pending migrations");
    }
    for migration in applied {
        info!("Migration {} applied successfully", migration);
    }
    Ok(())
}
