use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// The single live quiz round for a user.
#[derive(Debug, Clone)]
pub struct RoundRow {
    pub uid: String,
    pub target_word: String,
    /// 1-based position of the correct answer among the displayed options.
    pub correct_option: i64,
    /// Mastery score of the target when the round was presented. Scoring is
    /// applied relative to this snapshot, not to the current score.
    pub score_at_round: i64,
    pub shown_meaning: String,
}

pub async fn get(pool: &SqlitePool, uid: &str) -> Result<Option<RoundRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "uid", "targetWord", "correctOption", "scoreAtRound", "shownMeaning"
        FROM "game_rounds"
        WHERE "uid" = $1
        LIMIT 1
        "#,
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| map_row(&row)))
}

pub async fn upsert(pool: &SqlitePool, round: &RoundRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "game_rounds" ("uid", "targetWord", "correctOption", "scoreAtRound", "shownMeaning")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("uid") DO UPDATE SET
          "targetWord" = EXCLUDED."targetWord",
          "correctOption" = EXCLUDED."correctOption",
          "scoreAtRound" = EXCLUDED."scoreAtRound",
          "shownMeaning" = EXCLUDED."shownMeaning",
          "updatedAt" = datetime('now')
        "#,
    )
    .bind(&round.uid)
    .bind(&round.target_word)
    .bind(round.correct_option)
    .bind(round.score_at_round)
    .bind(&round.shown_meaning)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear(pool: &SqlitePool, uid: &str) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM "game_rounds" WHERE "uid" = $1"#)
        .bind(uid)
        .execute(pool)
        .await?;

    Ok(())
}

fn map_row(row: &SqliteRow) -> RoundRow {
    RoundRow {
        uid: row.try_get("uid").unwrap_or_default(),
        target_word: row.try_get("targetWord").unwrap_or_default(),
        correct_option: row.try_get("correctOption").unwrap_or(0),
        score_at_round: row.try_get("scoreAtRound").unwrap_or(0),
        shown_meaning: row.try_get("shownMeaning").unwrap_or_default(),
    }
}
