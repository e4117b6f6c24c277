//! Database layer: connection setup, migrations, models, and repositories.

pub mod errors;
pub mod handlers;
pub mod models;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Get the routelens database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the configured SQLite database, creating the file if missing,
/// and bring the schema up to date.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;

    // WAL lets dashboard reads proceed while a batch is appending records
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    migrator().run(&pool).await?;
    info!("Database ready at {}", database_url);
    Ok(pool)
}
