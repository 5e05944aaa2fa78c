//! JSON caching with Redis.
//!
//! Short-lived cache for read-mostly listings (the activity catalog in
//! particular). Values are stored as JSON strings under
//! `{prefix}:{key}` with a fixed TTL; writers invalidate the key explicitly.

use crate::{AppError, AppResult};
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface};
use fred::types::Expiration;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Default cache TTL: 60 seconds.
const DEFAULT_CACHE_TTL_SECS: i64 = 60;

/// Redis-backed JSON cache.
#[derive(Clone)]
pub struct JsonCache {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl_secs: i64,
}

impl JsonCache {
    /// Create a new cache with the default TTL.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// Create a new cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(redis: Arc<RedisClient>, prefix: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            ttl_secs: ttl_secs.max(1),
        }
    }

    /// Connect to Redis and build a cache.
    pub async fn connect(url: &str, prefix: impl Into<String>, ttl_secs: i64) -> AppResult<Self> {
        let config = fred::types::config::Config::from_url(url)
            .map_err(|e| AppError::Config(format!("Invalid Redis URL: {e}")))?;
        let client = RedisClient::new(config, None, None, None);
        client.connect();
        client
            .wait_for_connect()
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        info!("Connected to Redis cache");
        Ok(Self::with_ttl(Arc::new(client), prefix, ttl_secs))
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// Get a cached value.
    ///
    /// Returns `Ok(None)` on a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let full_key = self.cache_key(key);

        let result: Option<String> = self
            .redis
            .get(full_key.clone())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        match result {
            Some(json_str) => {
                debug!(key = %full_key, "Cache hit");
                serde_json::from_str(&json_str)
                    .map(Some)
                    .map_err(|e| AppError::Internal(format!("Corrupt cache entry: {e}")))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Store a value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json_str = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize cache entry: {e}")))?;

        self.redis
            .set::<(), _, _>(
                self.cache_key(key),
                json_str,
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }

    /// Drop a cached value.
    pub async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.cache_key(key))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        debug!(key = %key, "Invalidated cache entry");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn offline_cache(prefix: &str) -> JsonCache {
        let client = RedisClient::new(fred::types::config::Config::default(), None, None, None);
        JsonCache::new(Arc::new(client), prefix)
    }

    #[test]
    fn test_cache_key_generation() {
        let cache = offline_cache("edumatch");
        assert_eq!(cache.cache_key("activities"), "edumatch:activities");
    }

    #[test]
    fn test_ttl_is_at_least_one_second() {
        let client = RedisClient::new(fred::types::config::Config::default(), None, None, None);
        let cache = JsonCache::with_ttl(Arc::new(client), "edumatch", 0);
        assert_eq!(cache.ttl_secs, 1);
    }
}
