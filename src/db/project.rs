use crate::db::StoreError;
use crate::models::ProjectRecord;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

const PROJECT_COLUMNS: &str = "chain_id, project_id, address, owner, paused, payment_methods, packages, \
     extra_times, chain_update_timestamp, avatar_url, categories, domain, domain_token, domain_verified";

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn from_json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, StoreError> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(format!("{}: {}", column, e)))
}

fn row_to_record(row: &SqliteRow) -> Result<ProjectRecord, StoreError> {
    Ok(ProjectRecord {
        chain_id: row.try_get::<i64, _>("chain_id")? as u64,
        project_id: row.try_get::<i64, _>("project_id")? as u64,
        address: row.try_get("address")?,
        owner: row.try_get("owner")?,
        paused: row.try_get::<i64, _>("paused")? != 0,
        payment_methods: from_json(row, "payment_methods")?,
        packages: from_json(row, "packages")?,
        extra_times: from_json(row, "extra_times")?,
        chain_update_timestamp: row.try_get::<i64, _>("chain_update_timestamp")? as u64,
        avatar_url: row.try_get("avatar_url")?,
        categories: from_json(row, "categories")?,
        domain: row.try_get("domain")?,
        domain_token: row.try_get("domain_token")?,
        domain_verified: row.try_get::<i64, _>("domain_verified")? != 0,
    })
}

pub async fn find_project(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    project_id: u64,
) -> Result<Option<ProjectRecord>, StoreError> {
    let sql = format!(
        "SELECT {} FROM projects WHERE chain_id = ? AND project_id = ?",
        PROJECT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(chain_id as i64)
        .bind(project_id as i64)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

pub async fn insert_project(pool: &Pool<Sqlite>, record: &ProjectRecord) -> Result<(), StoreError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO projects
        (chain_id, project_id, address, owner, paused, payment_methods, packages, extra_times,
         chain_update_timestamp, avatar_url, categories, domain, domain_token, domain_verified, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.chain_id as i64)
    .bind(record.project_id as i64)
    .bind(&record.address)
    .bind(&record.owner)
    .bind(record.paused as i64)
    .bind(to_json(&record.payment_methods)?)
    .bind(to_json(&record.packages)?)
    .bind(to_json(&record.extra_times)?)
    .bind(record.chain_update_timestamp as i64)
    .bind(&record.avatar_url)
    .bind(to_json(&record.categories)?)
    .bind(&record.domain)
    .bind(&record.domain_token)
    .bind(record.domain_verified as i64)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(StoreError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

/// Returns false when the stored watermark is already at or past the record's
pub async fn update_chain_state(pool: &Pool<Sqlite>, record: &ProjectRecord) -> Result<bool, StoreError> {
    // The watermark guard keeps a slower writer from rolling state back
    let result = sqlx::query(
        r#"
        UPDATE projects
        SET owner = ?, paused = ?, payment_methods = ?, packages = ?, extra_times = ?,
            chain_update_timestamp = ?
        WHERE chain_id = ? AND project_id = ? AND chain_update_timestamp < ?
        "#,
    )
    .bind(&record.owner)
    .bind(record.paused as i64)
    .bind(to_json(&record.payment_methods)?)
    .bind(to_json(&record.packages)?)
    .bind(to_json(&record.extra_times)?)
    .bind(record.chain_update_timestamp as i64)
    .bind(record.chain_id as i64)
    .bind(record.project_id as i64)
    .bind(record.chain_update_timestamp as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_avatar(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    project_id: u64,
    avatar_url: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE projects SET avatar_url = ? WHERE chain_id = ? AND project_id = ?")
        .bind(avatar_url)
        .bind(chain_id as i64)
        .bind(project_id as i64)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_categories(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    project_id: u64,
    categories: &[String],
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE projects SET categories = ? WHERE chain_id = ? AND project_id = ?")
        .bind(to_json(&categories)?)
        .bind(chain_id as i64)
        .bind(project_id as i64)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_domain_challenge(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    project_id: u64,
    domain: &str,
    token: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE projects SET domain = ?, domain_token = ?, domain_verified = 0
         WHERE chain_id = ? AND project_id = ?",
    )
    .bind(domain)
    .bind(token)
    .bind(chain_id as i64)
    .bind(project_id as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_domain_verified(
    pool: &Pool<Sqlite>,
    chain_id: u64,
    project_id: u64,
    verified: bool,
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE projects SET domain_verified = ? WHERE chain_id = ? AND project_id = ?")
        .bind(verified as i64)
        .bind(chain_id as i64)
        .bind(project_id as i64)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_project_ids(pool: &Pool<Sqlite>, chain_id: u64) -> Result<Vec<u64>, StoreError> {
    let rows = sqlx::query("SELECT project_id FROM projects WHERE chain_id = ? ORDER BY project_id")
        .bind(chain_id as i64)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<u64, StoreError> { Ok(row.try_get::<i64, _>("project_id")? as u64) })
        .collect()
}
