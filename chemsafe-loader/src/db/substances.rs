//! Substance database operations

use super::{statements, symbols};
use chemsafe_common::{text, CompositeKey, Result, Substance};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

const SUBSTANCE_COLUMNS: &str = "id, name, formula, pubchem_id, cas_number, signal_word, \
                                 ridadr, wgk_germany, rtecs, source";

/// Escape LIKE wildcards so the term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn substance_from_row(row: &SqliteRow) -> Substance {
    Substance {
        id: Some(row.get("id")),
        name: row.get("name"),
        formula: row.get("formula"),
        pubchem_id: row.get("pubchem_id"),
        cas_number: row.get("cas_number"),
        signal_word: row.get("signal_word"),
        ridadr: row.get("ridadr"),
        wgk_germany: row.get("wgk_germany"),
        rtecs: row.get("rtecs"),
        source: row.get("source"),
        symbols: Vec::new(),
        statements: Vec::new(),
    }
}

/// Load substance by id, with its statements and symbols
pub async fn load_substance(pool: &SqlitePool, id: i64) -> Result<Option<Substance>> {
    let sql = format!("SELECT {} FROM substances WHERE id = ?", SUBSTANCE_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;

    match row {
        Some(row) => {
            let mut substance = substance_from_row(&row);
            substance.statements = statements::load_statements_for_substance(pool, id).await?;
            substance.symbols = symbols::load_symbols_for_substance(pool, id).await?;
            Ok(Some(substance))
        }
        None => Ok(None),
    }
}

/// First substance (lowest id) matching the term by CAS number, formula,
/// pubchem id, or name substring
pub async fn find_by_any(pool: &SqlitePool, term: &str) -> Result<Option<Substance>> {
    let term = text::trim(term);
    if term.is_empty() {
        return Ok(None);
    }
    let pubchem_id: Option<i64> = term.parse().ok();

    let id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM substances
        WHERE cas_number = ?
           OR formula = ?
           OR name LIKE ? ESCAPE '\'
           OR pubchem_id = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(term)
    .bind(term)
    .bind(like_pattern(term))
    .bind(pubchem_id)
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => load_substance(pool, id).await,
        None => Ok(None),
    }
}

/// Exact name match
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Substance>> {
    let id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM substances WHERE name = ? ORDER BY id ASC LIMIT 1")
            .bind(text::trim(name))
            .fetch_optional(pool)
            .await?;

    match id {
        Some(id) => load_substance(pool, id).await,
        None => Ok(None),
    }
}

/// Exact match on (formula, rtecs, pubchem_id, signal_word); NULL matches NULL
pub async fn find_by_composite(pool: &SqlitePool, key: &CompositeKey) -> Result<Option<Substance>> {
    let mut conn = pool.acquire().await?;
    let id = composite_id(&mut conn, key).await?;
    drop(conn);

    match id {
        Some(id) => load_substance(pool, id).await,
        None => Ok(None),
    }
}

pub async fn composite_id(conn: &mut SqliteConnection, key: &CompositeKey) -> Result<Option<i64>> {
    let id = sqlx::query_scalar(
        r#"
        SELECT id FROM substances
        WHERE formula IS ? AND rtecs IS ? AND pubchem_id IS ? AND signal_word IS ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(&key.formula)
    .bind(&key.rtecs)
    .bind(key.pubchem_id)
    .bind(&key.signal_word)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

/// Lowest id with exactly this name
pub async fn name_id(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM substances WHERE name = ? ORDER BY id ASC LIMIT 1")
        .bind(text::trim(name))
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert a substance and link its statements and symbols by name
///
/// The referenced statements and symbols must already exist on this
/// connection (see `upsert_statement` / `upsert_symbol`).
pub async fn insert_substance(conn: &mut SqliteConnection, substance: &Substance) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO substances (
            name, formula, pubchem_id, cas_number, signal_word,
            ridadr, wgk_germany, rtecs, source
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&substance.name)
    .bind(&substance.formula)
    .bind(substance.pubchem_id)
    .bind(&substance.cas_number)
    .bind(&substance.signal_word)
    .bind(&substance.ridadr)
    .bind(substance.wgk_germany)
    .bind(&substance.rtecs)
    .bind(&substance.source)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for statement in &substance.statements {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO substance_statements (substance_id, statement_id)
            SELECT ?, id FROM statements WHERE name = ?
            "#,
        )
        .bind(id)
        .bind(&statement.name)
        .execute(&mut *conn)
        .await?;
    }

    for symbol in &substance.symbols {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO substance_symbols (substance_id, symbol_id)
            SELECT ?, id FROM symbols WHERE name = ?
            "#,
        )
        .bind(id)
        .bind(&symbol.name)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}
