use sqlx::postgres::PgPool;

/// Round-trip a trivial query; used by the health endpoint
pub async fn health_check(pool: &PgPool) -> anyhow::Result<bool> {
    let _result = sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await?;

    Ok(true)
}
