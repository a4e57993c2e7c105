use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// A shared vocabulary row. Immutable once created.
#[derive(Debug, Clone)]
pub struct WordRow {
    pub word: String,
    pub meaning: String,
    pub examples: Vec<String>,
}

pub async fn get(pool: &SqlitePool, word: &str) -> Result<Option<WordRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "word", "meaning", "examples"
        FROM "words"
        WHERE "word" = $1
        LIMIT 1
        "#,
    )
    .bind(word)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| map_row(&row)))
}

/// Inserts a new shared word. `INSERT OR IGNORE` keeps a concurrent first-add
/// race idempotent; an existing row is never overwritten.
pub async fn insert(
    pool: &SqlitePool,
    word: &str,
    meaning: &str,
    examples: &[String],
) -> Result<(), sqlx::Error> {
    let examples_json = serde_json::to_string(examples).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO "words" ("word", "meaning", "examples")
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(word)
    .bind(meaning)
    .bind(examples_json)
    .execute(pool)
    .await?;

    Ok(())
}

fn map_row(row: &SqliteRow) -> WordRow {
    let examples_json: String = row.try_get("examples").unwrap_or_default();

    WordRow {
        word: row.try_get("word").unwrap_or_default(),
        meaning: row.try_get("meaning").unwrap_or_default(),
        examples: serde_json::from_str(&examples_json).unwrap_or_default(),
    }
}
