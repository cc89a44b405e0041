//! In-process cache store implementation using Moka

use super::store::{CacheError, CacheStore};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
enum SlotData {
    Value(Value),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    data: SlotData,
    /// None keeps the entry until it is deleted or evicted for capacity
    ttl: Option<Duration>,
}

impl Slot {
    fn new(data: SlotData, ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { None } else { Some(ttl) };
        Self { data, ttl }
    }
}

/// Each entry expires after its own TTL, renewed on overwrite
struct PerEntryExpiry;

impl Expiry<String, Slot> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Slot, _created_at: Instant) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

#[derive(Clone)]
pub struct MemoryCacheStore {
    cache: Cache<String, Slot>,
}

impl MemoryCacheStore {
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let value = self.cache.get(key).await.map(|slot| match slot.data {
            SlotData::Value(value) => value,
            SlotData::Set(members) => Value::Array(members.into_iter().map(Value::String).collect()),
        });
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), Slot::new(SlotData::Value(value), ttl))
            .await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError> {
        // Upsert runs under moka's per-key lock, so concurrent adds compose
        self.cache
            .entry(key.to_string())
            .and_upsert_with(|existing| {
                let mut members = match existing.map(|entry| entry.into_value().data) {
                    Some(SlotData::Set(members)) => members,
                    _ => HashSet::new(),
                };
                members.insert(member.to_string());
                std::future::ready(Slot::new(SlotData::Set(members), ttl))
            })
            .await;

        debug!("Added member to set {}", key);
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let members = match self.cache.get(key).await {
            Some(Slot { data: SlotData::Set(members), .. }) => members.into_iter().collect(),
            _ => Vec::new(),
        };
        Ok(members)
    }
}
