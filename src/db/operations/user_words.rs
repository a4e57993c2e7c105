use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone)]
pub struct UserWordRow {
    pub uid: String,
    pub word: String,
    pub is_deleted: bool,
    pub is_edited: bool,
    pub edited_meaning: Option<String>,
    pub mastery_score: i64,
}

/// A quiz candidate: an active user word joined with its shared entry.
#[derive(Debug, Clone)]
pub struct PoolWord {
    pub word: String,
    pub meaning: String,
    pub mastery_score: i64,
    pub examples: Vec<String>,
}

pub async fn get(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
) -> Result<Option<UserWordRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "uid", "word", "isDeleted", "isEdited", "editedMeaning", "masteryScore"
        FROM "user_words"
        WHERE "uid" = $1
          AND "word" = $2
        LIMIT 1
        "#,
    )
    .bind(uid)
    .bind(word)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| map_row(&row)))
}

pub async fn insert(pool: &SqlitePool, uid: &str, word: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO "user_words" ("uid", "word")
        VALUES ($1, $2)
        "#,
    )
    .bind(uid)
    .bind(word)
    .execute(pool)
    .await?;

    Ok(())
}

/// Creates an entry that carries its own meaning, for words the shared store
/// does not know.
pub async fn insert_override(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
    meaning: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO "user_words" ("uid", "word", "isEdited", "editedMeaning")
        VALUES ($1, $2, 1, $3)
        "#,
    )
    .bind(uid)
    .bind(word)
    .bind(meaning)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_deleted(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
    deleted: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "user_words"
        SET "isDeleted" = $1
        WHERE "uid" = $2
          AND "word" = $3
        "#,
    )
    .bind(deleted)
    .bind(uid)
    .bind(word)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a user-specific meaning and revives the entry if it was deleted.
pub async fn set_edit(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
    meaning: &str,
    undelete: bool,
) -> Result<(), sqlx::Error> {
    if undelete {
        sqlx::query(
            r#"
            UPDATE "user_words"
            SET "isEdited" = 1, "editedMeaning" = $1, "isDeleted" = 0
            WHERE "uid" = $2
              AND "word" = $3
            "#,
        )
        .bind(meaning)
        .bind(uid)
        .bind(word)
        .execute(pool)
        .await?;
    } else {
        sqlx::query(
            r#"
            UPDATE "user_words"
            SET "isEdited" = 1, "editedMeaning" = $1
            WHERE "uid" = $2
              AND "word" = $3
            "#,
        )
        .bind(meaning)
        .bind(uid)
        .bind(word)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn set_score(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
    score: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "user_words"
        SET "masteryScore" = $1
        WHERE "uid" = $2
          AND "word" = $3
        "#,
    )
    .bind(score)
    .bind(uid)
    .bind(word)
    .execute(pool)
    .await?;

    Ok(())
}

/// Active entries with their effective meanings, ordered by word. Entries
/// created by manual override have no shared row, hence the left join.
pub async fn list_active(
    pool: &SqlitePool,
    uid: &str,
) -> Result<Vec<(String, String)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
          uw."word",
          CASE WHEN uw."isEdited" = 1 THEN uw."editedMeaning" ELSE w."meaning" END AS "meaning"
        FROM "user_words" uw
        LEFT JOIN "words" w ON w."word" = uw."word"
        WHERE uw."uid" = $1
          AND uw."isDeleted" = 0
        ORDER BY uw."word" ASC
        "#,
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            (
                row.try_get::<String, _>("word").unwrap_or_default(),
                row.try_get::<Option<String>, _>("meaning")
                    .unwrap_or_default()
                    .unwrap_or_default(),
            )
        })
        .collect())
}

/// Quiz candidates: active, not yet mastered, and backed by a shared row so
/// an example sentence exists to display. Inner join drops manual overrides.
pub async fn quiz_pool(pool: &SqlitePool, uid: &str) -> Result<Vec<PoolWord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
          uw."word",
          uw."masteryScore",
          CASE WHEN uw."isEdited" = 1 THEN uw."editedMeaning" ELSE w."meaning" END AS "meaning",
          w."examples"
        FROM "user_words" uw
        JOIN "words" w ON w."word" = uw."word"
        WHERE uw."uid" = $1
          AND uw."isDeleted" = 0
          AND uw."masteryScore" <= 5
        ORDER BY uw."word" ASC
        "#,
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let examples_json: String = row.try_get("examples").unwrap_or_default();
            PoolWord {
                word: row.try_get("word").unwrap_or_default(),
                meaning: row
                    .try_get::<Option<String>, _>("meaning")
                    .unwrap_or_default()
                    .unwrap_or_default(),
                mastery_score: row.try_get("masteryScore").unwrap_or(0),
                examples: serde_json::from_str(&examples_json).unwrap_or_default(),
            }
        })
        .collect())
}

pub async fn count_active(pool: &SqlitePool, uid: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM "user_words"
        WHERE "uid" = $1
          AND "isDeleted" = 0
        "#,
    )
    .bind(uid)
    .fetch_one(pool)
    .await
}

/// Mastered words are distinguished from manually deleted ones only by their
/// score having reached 5.
pub async fn count_mastered(pool: &SqlitePool, uid: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM "user_words"
        WHERE "uid" = $1
          AND "isDeleted" = 1
          AND "masteryScore" = 5
        "#,
    )
    .bind(uid)
    .fetch_one(pool)
    .await
}

fn map_row(row: &SqliteRow) -> UserWordRow {
    UserWordRow {
        uid: row.try_get("uid").unwrap_or_default(),
        word: row.try_get("word").unwrap_or_default(),
        is_deleted: row.try_get("isDeleted").unwrap_or(false),
        is_edited: row.try_get("isEdited").unwrap_or(false),
        edited_meaning: row.try_get("editedMeaning").unwrap_or(None),
        mastery_score: row.try_get("masteryScore").unwrap_or(0),
    }
}
