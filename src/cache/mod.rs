//! Query cache
//!
//! Read-through cache for responses from the remote platform API.
//! It supports:
//! - In-memory cache (moka) - default
//! - Disabled cache - every read goes to the remote service
//!
//! The cache driver is selected based on configuration. Only data that the
//! client never writes (content, steps, template lists) is cached; progress
//! and answers are always read from the server.
//!
//! # Usage
//!
//! ```rust,ignore
//! use woispace::cache::create_cache;
//! use woispace::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! let steps = cache
//!     .get_or_load("steps:template:4", ttl, || api.get_steps_for_template(4))
//!     .await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, CacheDriver};

/// Cache layer trait
///
/// This trait defines the interface for cache implementations.
/// Note: Due to Rust's object safety rules, this trait cannot be used
/// as a trait object (`dyn CacheLayer`). Use the `Cache` enum instead
/// for runtime polymorphism.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// Unified cache enum for runtime polymorphism
#[derive(Debug)]
pub enum Cache {
    /// In-memory cache using moka
    Memory(MemoryCache),
    /// Pass-through: never stores anything
    Disabled,
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(cache) => cache.get(key).await,
            Cache::Disabled => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete(key).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete_pattern(pattern).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn clear(&self) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.clear().await,
            Cache::Disabled => Ok(()),
        }
    }
}

impl Cache {
    /// Return the cached value for `key`, or run `load`, cache its result and return it.
    ///
    /// Cache failures are logged and treated as misses; only errors from
    /// `load` are returned to the caller.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, ttl: Duration, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => {
                tracing::trace!(key, "cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(key, error = %e, "cache read failed, loading from source"),
        }

        let value = load().await?;
        if let Err(e) = self.set(key, &value, ttl).await {
            tracing::debug!(key, error = %e, "cache write failed");
        }
        Ok(value)
    }

    /// Invalidate every key matching `pattern`, logging instead of failing.
    pub async fn invalidate(&self, pattern: &str) {
        if let Err(e) = self.delete_pattern(pattern).await {
            tracing::warn!(pattern, error = %e, "cache invalidation failed");
        }
    }
}

/// Create a cache instance based on configuration
///
/// - `CacheDriver::Memory` - Creates an in-memory cache using moka
/// - `CacheDriver::None` - Creates a pass-through cache
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    let ttl = Duration::from_secs(config.ttl_seconds);

    match config.driver {
        CacheDriver::Memory => {
            let cache = MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl);
            Arc::new(Cache::Memory(cache))
        }
        CacheDriver::None => Arc::new(Cache::Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_create_memory_cache() {
        let cache = create_cache(&CacheConfig::default());

        cache.set("test_key", &"test_value".to_string(), Duration::from_secs(60)).await.unwrap();
        let result: Option<String> = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some("test_value".to_string()));
    }

    #[tokio::test]
    async fn test_disabled_cache_never_stores() {
        let config = CacheConfig {
            driver: CacheDriver::None,
            max_capacity: 10,
            ttl_seconds: 60,
        };
        let cache = create_cache(&config);

        cache.set("key", &"value".to_string(), Duration::from_secs(60)).await.unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_get_or_load_hits_source_once() {
        let cache = create_cache(&CacheConfig::default());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i64>, String> = cache
                .get_or_load("steps:template:1", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_does_not_cache_errors() {
        let cache = create_cache(&CacheConfig::default());
        let calls = AtomicUsize::new(0);

        let first: Result<String, String> = cache
            .get_or_load("flaky", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            })
            .await;
        assert!(first.is_err());

        let second: Result<String, String> = cache
            .get_or_load("flaky", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("ok".to_string())
            })
            .await;
        assert_eq!(second.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_removes_matching_keys() {
        let cache = create_cache(&CacheConfig::default());
        cache.set("templates:all", &vec![1i64], Duration::from_secs(60)).await.unwrap();
        cache.set("templates:section:3", &vec![2i64], Duration::from_secs(60)).await.unwrap();
        cache.set("steps:template:1", &vec![3i64], Duration::from_secs(60)).await.unwrap();

        cache.invalidate("templates:*").await;

        assert_eq!(cache.get::<Vec<i64>>("templates:all").await.unwrap(), None);
        assert_eq!(cache.get::<Vec<i64>>("templates:section:3").await.unwrap(), None);
        assert_eq!(cache.get::<Vec<i64>>("steps:template:1").await.unwrap(), Some(vec![3]));
    }
}
