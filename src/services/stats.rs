use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::db::operations::{user_actions, user_words};

const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct Summary {
    pub active_words: i64,
    pub mastered_words: i64,
    pub weekly_attempts: i64,
    pub weekly_wins: i64,
    pub weekly_mastered: i64,
}

/// Learning summary: dictionary counts plus quiz activity over the trailing
/// seven days.
pub async fn summarize(pool: &SqlitePool, uid: &str) -> Result<Summary, sqlx::Error> {
    let active_words = user_words::count_active(pool, uid).await?;
    let mastered_words = user_words::count_mastered(pool, uid).await?;

    let since = (Utc::now() - Duration::days(WINDOW_DAYS)).naive_utc();
    let weekly = user_actions::weekly_activity(pool, uid, since).await?;

    Ok(Summary {
        active_words,
        mastered_words,
        weekly_attempts: weekly.attempts,
        weekly_wins: weekly.wins,
        weekly_mastered: weekly.mastered,
    })
}
