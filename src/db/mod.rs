pub mod connection;
pub mod favorite;
pub mod project;

use crate::models::ProjectRecord;
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

pub const INIT_SCHEMA: &str = r#"
-- Local projection of chain projects
CREATE TABLE IF NOT EXISTS projects (
    chain_id INTEGER NOT NULL,
    project_id INTEGER NOT NULL,
    address TEXT NOT NULL,
    owner TEXT NOT NULL,
    paused INTEGER NOT NULL DEFAULT 0,
    payment_methods TEXT NOT NULL DEFAULT '[]',
    packages TEXT NOT NULL DEFAULT '[]',
    extra_times TEXT NOT NULL DEFAULT '[]',
    chain_update_timestamp INTEGER NOT NULL DEFAULT 0,
    avatar_url TEXT,
    categories TEXT NOT NULL DEFAULT '[]',
    domain TEXT,
    domain_token TEXT,
    domain_verified INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    UNIQUE (chain_id, project_id)
);

-- User favorites
CREATE TABLE IF NOT EXISTS favorites (
    chain_id INTEGER NOT NULL,
    user_address TEXT NOT NULL,
    project_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (chain_id, user_address, project_id)
);

-- Create indexes for efficient querying
CREATE INDEX IF NOT EXISTS idx_projects_chain ON projects(chain_id);
CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(chain_id, user_address, created_at);
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record already exists")]
    AlreadyExists,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record is malformed: {0}")]
    Corrupt(String),
}

/// Document-store access for project projections, keyed by (chain_id, project_id)
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_project(&self, chain_id: u64, project_id: u64) -> Result<Option<ProjectRecord>, StoreError>;

    /// Fails with `AlreadyExists` when the pair is taken
    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), StoreError>;

    /// Write chain-tracked fields and the watermark only. `false` when the
    /// stored watermark was not older, leaving the row untouched
    async fn update_chain_state(&self, record: &ProjectRecord) -> Result<bool, StoreError>;

    async fn set_avatar(&self, chain_id: u64, project_id: u64, avatar_url: &str) -> Result<bool, StoreError>;

    async fn set_categories(&self, chain_id: u64, project_id: u64, categories: &[String]) -> Result<bool, StoreError>;

    /// Store a pending domain challenge and reset verification
    async fn set_domain_challenge(
        &self,
        chain_id: u64,
        project_id: u64,
        domain: &str,
        token: &str,
    ) -> Result<bool, StoreError>;

    async fn set_domain_verified(&self, chain_id: u64, project_id: u64, verified: bool) -> Result<bool, StoreError>;

    async fn list_project_ids(&self, chain_id: u64) -> Result<Vec<u64>, StoreError>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Returns false when the favorite already existed
    async fn add_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, StoreError>;

    /// Returns false when there was nothing to remove
    async fn remove_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, StoreError>;

    async fn count_favorites(&self, chain_id: u64, user: &str) -> Result<u64, StoreError>;

    async fn list_favorites(&self, chain_id: u64, user: &str, offset: u64, limit: u64) -> Result<Vec<u64>, StoreError>;
}

/// SQLite-backed implementation of both stores
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn find_project(&self, chain_id: u64, project_id: u64) -> Result<Option<ProjectRecord>, StoreError> {
        project::find_project(&self.pool, chain_id, project_id).await
    }

    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), StoreError> {
        project::insert_project(&self.pool, record).await
    }

    async fn update_chain_state(&self, record: &ProjectRecord) -> Result<bool, StoreError> {
        project::update_chain_state(&self.pool, record).await
    }

    async fn set_avatar(&self, chain_id: u64, project_id: u64, avatar_url: &str) -> Result<bool, StoreError> {
        project::set_avatar(&self.pool, chain_id, project_id, avatar_url).await
    }

    async fn set_categories(&self, chain_id: u64, project_id: u64, categories: &[String]) -> Result<bool, StoreError> {
        project::set_categories(&self.pool, chain_id, project_id, categories).await
    }

    async fn set_domain_challenge(
        &self,
        chain_id: u64,
        project_id: u64,
        domain: &str,
        token: &str,
    ) -> Result<bool, StoreError> {
        project::set_domain_challenge(&self.pool, chain_id, project_id, domain, token).await
    }

    async fn set_domain_verified(&self, chain_id: u64, project_id: u64, verified: bool) -> Result<bool, StoreError> {
        project::set_domain_verified(&self.pool, chain_id, project_id, verified).await
    }

    async fn list_project_ids(&self, chain_id: u64) -> Result<Vec<u64>, StoreError> {
        project::list_project_ids(&self.pool, chain_id).await
    }
}

#[async_trait]
impl FavoriteStore for SqliteStore {
    async fn add_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, StoreError> {
        favorite::add_favorite(&self.pool, chain_id, user, project_id).await
    }

    async fn remove_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, StoreError> {
        favorite::remove_favorite(&self.pool, chain_id, user, project_id).await
    }

    async fn count_favorites(&self, chain_id: u64, user: &str) -> Result<u64, StoreError> {
        favorite::count_favorites(&self.pool, chain_id, user).await
    }

    async fn list_favorites(&self, chain_id: u64, user: &str, offset: u64, limit: u64) -> Result<Vec<u64>, StoreError> {
        favorite::list_favorites(&self.pool, chain_id, user, offset, limit).await
    }
}
