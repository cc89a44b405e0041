use crate::db::StoreError;
use sqlx::{Pool, Row, Sqlite};

pub async fn add_favorite(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    user: &str,
    project_id: u64,
) -> Result<bool, StoreError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "INSERT INTO favorites (chain_id, user_address, project_id, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(chain_id, user_address, project_id) DO NOTHING",
    )
    .bind(chain_id as i64)
    .bind(user)
    .bind(project_id as i64)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove_favorite(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    user: &str,
    project_id: u64,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "DELETE FROM favorites WHERE chain_id = ? AND user_address = ? AND project_id = ?",
    )
    .bind(chain_id as i64)
    .bind(user)
    .bind(project_id as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_favorites(pool: &Pool<Sqlite>, chain_id: u64, user: &str) -> Result<u64, StoreError> {
    let count = sqlx::query("SELECT COUNT(*) FROM favorites WHERE chain_id = ? AND user_address = ?")
        .bind(chain_id as i64)
        .bind(user)
        .fetch_one(pool)
        .await?
        .try_get::<i64, _>(0)?;

    Ok(count as u64)
}

pub async fn list_favorites(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    user: &str,
    offset: u64,
    limit: u64,
) -> Result<Vec<u64>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT project_id FROM favorites
           WHERE chain_id = ? AND user_address = ?
           ORDER BY created_at DESC, project_id DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(chain_id as i64)
    .bind(user)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<u64, StoreError> { Ok(row.try_get::<i64, _>("project_id")? as u64) })
        .collect()
}
