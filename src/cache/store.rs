//! Backing store contract for the cache
//!
//! Values are opaque JSON. A zero TTL keeps an entry until it is deleted.
//! Set-membership operations back the page-set registry so that concurrent
//! registrations on one scope never drop each other's members.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache transport error: {0}")]
    Transport(String),

    #[error("Cache value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Deleting a missing key is not an error
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Add `member` to the set at `key` and refresh the set's TTL
    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Members of the set at `key`, empty when the set does not exist
    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError>;
}
