// SQLite connection pool and schema initialization

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::info;
use crate::db::INIT_SCHEMA;

pub async fn establish_connection(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // An in-memory database lives inside a single connection
    if database_url.contains(":memory:") {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::raw_sql(INIT_SCHEMA).execute(&pool).await?;
        return Ok(pool);
    }

    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database at {}", database_url);
        Sqlite::create_database(database_url).await?;
    }

    // Create connection pool
    let pool = SqlitePool::connect(database_url).await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    // Initialize schema
    sqlx::raw_sql(INIT_SCHEMA).execute(&pool).await?;

    Ok(pool)
}
