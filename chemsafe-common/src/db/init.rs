//! Database initialization
//!
//! Creates the database file on first run and applies the schema. All
//! statements are idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and apply the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers proceed while a resolution pass commits
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// Every pooled connection to `sqlite::memory:` would see its own empty
/// database, hence the pool size of one.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_substances_table(pool).await?;
    create_statements_table(pool).await?;
    create_symbols_table(pool).await?;

    // Linking tables
    create_substance_statements_table(pool).await?;
    create_substance_symbols_table(pool).await?;

    Ok(())
}

async fn create_substances_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS substances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            formula TEXT,
            pubchem_id INTEGER,
            cas_number TEXT,
            signal_word TEXT,
            ridadr TEXT,
            wgk_germany INTEGER,
            rtecs TEXT,
            source TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_substances_cas ON substances(cas_number)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_substances_formula ON substances(formula)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_statements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT CHECK (description IS NULL OR length(description) <= 1024),
            type INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_symbols_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS symbols (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_substance_statements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS substance_statements (
            substance_id INTEGER NOT NULL REFERENCES substances(id) ON DELETE CASCADE,
            statement_id INTEGER NOT NULL REFERENCES statements(id) ON DELETE CASCADE,
            PRIMARY KEY (substance_id, statement_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_substance_symbols_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS substance_symbols (
            substance_id INTEGER NOT NULL REFERENCES substances(id) ON DELETE CASCADE,
            symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
            PRIMARY KEY (substance_id, symbol_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
