//! Database Test Utilities

use anyhow::Result;
use chemsafe_common::Substance;
use chemsafe_loader::db::{Entity, PendingBatch, SqliteStore, SubstanceStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary file database with the schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_chemsafe.db");
    let pool = chemsafe_common::db::init_database(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Store over a fresh temporary database
pub async fn create_test_store() -> Result<(TempDir, Arc<SqliteStore>)> {
    let (temp_dir, pool) = create_test_db().await?;
    Ok((temp_dir, Arc::new(SqliteStore::new(pool))))
}

/// Persist a substance directly and return it as stored
pub async fn seed_substance(store: &SqliteStore, substance: Substance) -> Result<Substance> {
    let mut batch = PendingBatch::new();
    batch.save(Entity::Substance(substance));
    let mut stored = store.commit(batch).await?;
    Ok(stored.remove(0))
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {}", table);
    Ok(sqlx::query_scalar(&query).fetch_one(pool).await?)
}
