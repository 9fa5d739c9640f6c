//! File-backed TTL cache for API responses.
//!
//! Each key is stored as `<cache dir>/<key>.json` holding
//! `{"timestamp": <unix seconds>, "data": <payload>}`.  A dashboard that
//! restarts (or runs `--once` from cron) therefore reuses a recent response
//! instead of hitting the rate-limited APIs again.
//!
//! Only successful fetches are stored.  A corrupt or unreadable entry is
//! treated as a miss.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Freshness window for weather responses.
pub const WEATHER_TTL: Duration = Duration::from_secs(600);
/// Freshness window for the portfolio quote list.
pub const PORTFOLIO_TTL: Duration = Duration::from_secs(300);
/// Freshness window for the holdings summary.
pub const SUMMARY_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    timestamp: f64,
    data: T,
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Makes `key` safe to use as a file name.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | ':' | '\\' => '_',
            c => c,
        })
        .collect()
}

pub struct ApiCache {
    dir: PathBuf,
}

impl ApiCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }

    /// Returns the cached value for `key` if it is younger than `ttl`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        let entry: Entry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("ignoring corrupt cache entry {}: {e}", path.display());
                return None;
            }
        };
        let age = now_secs() - entry.timestamp;
        if (0.0..ttl.as_secs_f64()).contains(&age) {
            debug!(key, age = age as u64, "cache hit");
            Some(entry.data)
        } else {
            debug!(key, "cache entry expired");
            None
        }
    }

    /// Stores `data` under `key` with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the file
    /// cannot be written.
    pub async fn put<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let body = serde_json::to_vec(&Entry {
            timestamp: now_secs(),
            data,
        })?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| CacheError::Io { path, source })
    }

    /// Returns fresh cached data for `key`, or runs `fetch` and caches its
    /// successful result.
    ///
    /// A failure to write the cache is logged; the fetched value is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `fetch`'s error unchanged.  Nothing is cached in that case.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key, ttl).await {
            return Ok(cached);
        }
        let fresh = fetch().await?;
        if let Err(e) = self.put(key, &fresh).await {
            warn!("could not write cache entry {key}: {e}");
        }
        Ok(fresh)
    }

    /// Removes the entry for `key`.  A missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file exists but cannot be removed.
    pub async fn clear(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Removes every `*.json` entry and returns how many were removed.
    ///
    /// Other files in the directory (such as the simulated display output)
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be listed or an
    /// entry cannot be removed.
    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| CacheError::Io { path, source }
        };
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_err(&self.dir)(e)),
        };
        let mut removed = 0;
        while let Some(entry) = dir.next_entry().await.map_err(io_err(&self.dir))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path).await.map_err(io_err(&path))?;
                removed += 1;
            }
        }
        debug!(removed, "cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_cache() -> ApiCache {
        ApiCache::new(std::env::temp_dir().join(format!("inkdash-cache-{}", uuid::Uuid::new_v4())))
    }

    #[test]
    fn test_keys_are_sanitized() {
        assert_eq!(sanitize("weather_40.7_-74.0"), "weather_40.7_-74.0");
        assert_eq!(sanitize("a/b:c"), "a_b_c");
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        // Arrange
        let cache = temp_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![1, 2, 3])
        };

        // Act
        let first: Vec<i32> = cache.get_or_fetch("k", WEATHER_TTL, fetch).await.unwrap();
        let second: Vec<i32> = cache.get_or_fetch("k", WEATHER_TTL, fetch).await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = temp_cache();
        let failed: Result<u32, String> = cache.get_or_fetch("k", WEATHER_TTL, || async { Err("down".to_string()) }).await;
        assert_eq!(failed.unwrap_err(), "down");

        let ok: Result<u32, String> = cache.get_or_fetch("k", WEATHER_TTL, || async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        // Arrange: an entry written an hour ago
        let cache = temp_cache();
        std::fs::create_dir_all(cache.dir()).unwrap();
        let old = format!(r#"{{"timestamp": {}, "data": 1}}"#, now_secs() - 3600.0);
        std::fs::write(cache.dir().join("k.json"), old).unwrap();

        // Act
        let value: u32 = cache.get_or_fetch("k", PORTFOLIO_TTL, || async { Ok::<_, String>(2) }).await.unwrap();

        // Assert
        assert_eq!(value, 2);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let cache = temp_cache();
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.dir().join("k.json"), "{not json").unwrap();

        let value: u32 = cache.get_or_fetch("k", SUMMARY_TTL, || async { Ok::<_, String>(5) }).await.unwrap();

        assert_eq!(value, 5);
        assert_eq!(cache.get::<u32>("k", SUMMARY_TTL).await, Some(5));
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_clear_and_clear_all() {
        // Arrange
        let cache = temp_cache();
        cache.put("a", &1).await.unwrap();
        cache.put("b", &2).await.unwrap();
        std::fs::write(cache.dir().join("display_output.pbm"), b"P4").unwrap();

        // Act
        cache.clear("a").await.unwrap();
        cache.clear("missing").await.unwrap();
        let removed = cache.clear_all().await.unwrap();

        // Assert
        assert_eq!(removed, 1);
        assert!(cache.dir().join("display_output.pbm").exists());
        assert_eq!(cache.get::<u32>("b", SUMMARY_TTL).await, None);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_clear_all_on_missing_dir_is_zero() {
        let cache = temp_cache();
        assert_eq!(cache.clear_all().await.unwrap(), 0);
    }
}
