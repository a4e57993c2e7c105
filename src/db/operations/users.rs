use sqlx::SqlitePool;

/// Records a user on first contact. Later contacts are no-ops.
pub async fn ensure(pool: &SqlitePool, uid: &str, username: Option<&str>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO "users" ("uid", "username")
        VALUES ($1, $2)
        "#,
    )
    .bind(uid)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}
