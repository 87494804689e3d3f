//! Symbol database operations

use chemsafe_common::{Result, Symbol};
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Load symbol by name
pub async fn load_symbol_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Symbol>> {
    let row = sqlx::query("SELECT id, name FROM symbols WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| Symbol {
        id: Some(row.get("id")),
        name: row.get("name"),
    }))
}

/// Insert-or-fetch keyed on the name, returns the row id
pub async fn upsert_symbol(conn: &mut SqliteConnection, symbol: &Symbol) -> Result<i64> {
    sqlx::query("INSERT INTO symbols (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(&symbol.name)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM symbols WHERE name = ?")
        .bind(&symbol.name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Load all symbols linked to a substance, ordered by name
pub async fn load_symbols_for_substance(pool: &SqlitePool, substance_id: i64) -> Result<Vec<Symbol>> {
    let rows = sqlx::query(
        r#"
        SELECT sy.id, sy.name
        FROM symbols sy
        JOIN substance_symbols ss ON ss.symbol_id = sy.id
        WHERE ss.substance_id = ?
        ORDER BY sy.name
        "#,
    )
    .bind(substance_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Symbol {
            id: Some(row.get("id")),
            name: row.get("name"),
        })
        .collect())
}
