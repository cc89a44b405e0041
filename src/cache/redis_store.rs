//! Networked cache store backed by Redis

use super::store::{CacheError, CacheStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis cache at {}", url);
        Ok(Self { conn })
    }
}

/// Redis expiries are whole seconds; round sub-second TTLs up
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(&value)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(raw);
        if !ttl.is_zero() {
            cmd.arg("EX").arg(ttl_secs(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().cmd("SADD").arg(key).arg(member).ignore();
        if !ttl.is_zero() {
            pipe.cmd("EXPIRE").arg(key).arg(ttl_secs(ttl)).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = redis::cmd("SMEMBERS").arg(key).query_async(&mut conn).await?;
        Ok(members)
    }
}
