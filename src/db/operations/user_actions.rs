use chrono::{NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};

// Tags shared between the quiz engine and the statistics window.
pub const ACTION_WIN: &str = "win";
pub const ACTION_LOSE: &str = "lose";
pub const ACTION_MASTERED: &str = "translation_mastered";

#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyActivity {
    /// win + lose answers inside the window.
    pub attempts: i64,
    pub wins: i64,
    pub mastered: i64,
}

pub async fn log(pool: &SqlitePool, uid: &str, action: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "user_actions" ("uid", "action", "createdAt")
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(uid)
    .bind(action)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn weekly_activity(
    pool: &SqlitePool,
    uid: &str,
    since: NaiveDateTime,
) -> Result<WeeklyActivity, sqlx::Error> {
    // SQLite assigns $N parameters indices by first occurrence, so the
    // placeholders below are numbered in bind order.
    let row = sqlx::query(
        r#"
        SELECT
          SUM(CASE WHEN "action" IN ($1, $2) THEN 1 ELSE 0 END) AS "attempts",
          SUM(CASE WHEN "action" = $1 THEN 1 ELSE 0 END) AS "wins",
          SUM(CASE WHEN "action" = $3 THEN 1 ELSE 0 END) AS "mastered"
        FROM "user_actions"
        WHERE "uid" = $4
          AND "createdAt" >= $5
        "#,
    )
    .bind(ACTION_WIN)
    .bind(ACTION_LOSE)
    .bind(ACTION_MASTERED)
    .bind(uid)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(WeeklyActivity {
        attempts: row
            .try_get::<Option<i64>, _>("attempts")
            .unwrap_or(None)
            .unwrap_or(0),
        wins: row
            .try_get::<Option<i64>, _>("wins")
            .unwrap_or(None)
            .unwrap_or(0),
        mastered: row
            .try_get::<Option<i64>, _>("mastered")
            .unwrap_or(None)
            .unwrap_or(0),
    })
}
