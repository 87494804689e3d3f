//! Statement database operations

use chemsafe_common::{Result, Statement, StatementType};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

fn statement_from_row(row: &SqliteRow) -> Statement {
    Statement {
        id: Some(row.get("id")),
        name: row.get("name"),
        description: row.get("description"),
        statement_type: StatementType::from_code(row.get("type")),
    }
}

/// Load statement by its code
pub async fn load_statement_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Statement>> {
    let row = sqlx::query("SELECT id, name, description, type FROM statements WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(statement_from_row))
}

/// Insert-or-fetch keyed on the code
///
/// An existing row keeps its description unless the incoming statement
/// carries one. Returns the row id.
pub async fn upsert_statement(conn: &mut SqliteConnection, statement: &Statement) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO statements (name, description, type)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            description = COALESCE(excluded.description, statements.description)
        "#,
    )
    .bind(&statement.name)
    .bind(&statement.description)
    .bind(statement.statement_type.code())
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM statements WHERE name = ?")
        .bind(&statement.name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Load all statements linked to a substance, ordered by code
pub async fn load_statements_for_substance(
    pool: &SqlitePool,
    substance_id: i64,
) -> Result<Vec<Statement>> {
    let rows = sqlx::query(
        r#"
        SELECT st.id, st.name, st.description, st.type
        FROM statements st
        JOIN substance_statements ss ON ss.statement_id = st.id
        WHERE ss.substance_id = ?
        ORDER BY st.name
        "#,
    )
    .bind(substance_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(statement_from_row).collect())
}
