mod models;

pub use models::*;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Connect to a database by URL and bring the schema up to date.
/// Split out of `init` so tests can target `sqlite::memory:`.
pub async fn connect(db_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("shopr.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Catalog schema (categories, products)
    execute_sql(pool, include_str!("../../migrations/001_catalog.sql")).await?;

    // Migration 002: Customers table
    execute_sql(pool, include_str!("../../migrations/002_customers.sql")).await?;

    info!("Migrations completed");
    Ok(())
}
