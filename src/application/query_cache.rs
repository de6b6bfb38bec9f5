//! QueryCache - Keyed results with stale-while-revalidate reads.
//!
//! Each entry remembers when it was fetched and whether it has been marked
//! stale. Reads through [`QueryCache::fetch`]:
//!
//! | Entry   | Result                                        |
//! |---------|-----------------------------------------------|
//! | fresh   | cached value, no request                      |
//! | stale   | cached value now, refetch in the background   |
//! | missing | waits for the fetch                           |
//!
//! Concurrent fetches of one key share a single in-flight request.
//! [`invalidate`](QueryCache::invalidate) only marks entries stale; the next
//! read revalidates.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::time::Instant;

use crate::domain::cache::QueryKey;
use crate::ports::ApiError;

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

/// Default freshness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

struct Entry {
    value: CachedValue,
    fetched_at: Instant,
    stale: bool,
}

impl Entry {
    fn fresh(value: CachedValue) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            stale: false,
        }
    }
}

struct Inner {
    stale_time: Duration,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    in_flight: Mutex<HashMap<QueryKey, SharedFetch>>,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<QueryKey, SharedFetch>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_entry_stale(&self, entry: &Entry) -> bool {
        entry.stale || entry.fetched_at.elapsed() >= self.stale_time
    }
}

enum Lookup<T> {
    Fresh(Arc<T>),
    Stale(Arc<T>),
    Missing,
}

/// Shared query cache. Cheap to clone.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                stale_time,
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// Reads `key`, fetching with `fetcher` when missing or stale.
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error when there is no cached value to
    /// serve. Background revalidation failures are logged only.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        match self.lookup::<T>(&key) {
            Lookup::Fresh(value) => {
                tracing::trace!(key = %key, "Cache hit");
                return Ok(value);
            }
            Lookup::Stale(value) => {
                tracing::debug!(key = %key, "Serving stale entry; revalidating");
                let refetch = self.start_fetch(key.clone(), fetcher);
                tokio::spawn(async move {
                    if let Err(e) = refetch.await {
                        tracing::warn!(key = %key, error = %e, "Background revalidation failed");
                    }
                });
                return Ok(value);
            }
            Lookup::Missing => {}
        }

        let value = self.start_fetch(key.clone(), fetcher).await?;
        value.downcast::<T>().map_err(|_| {
            ApiError::Decode(format!("cached value for {} has an unexpected type", key))
        })
    }

    fn lookup<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Lookup<T> {
        let entries = self.inner.entries();
        let Some(entry) = entries.get(key) else {
            return Lookup::Missing;
        };
        match Arc::clone(&entry.value).downcast::<T>() {
            Ok(value) if self.inner.is_entry_stale(entry) => Lookup::Stale(value),
            Ok(value) => Lookup::Fresh(value),
            Err(_) => Lookup::Missing,
        }
    }

    /// Joins the in-flight fetch for `key` or starts one.
    fn start_fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut in_flight = self.inner.in_flight();
        if let Some(existing) = in_flight.get(&key) {
            tracing::trace!(key = %key, "Joining in-flight fetch");
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let fetch: BoxFuture<'static, Result<CachedValue, ApiError>> = async move {
            let result = fetcher().await.map(|value| Arc::new(value) as CachedValue);
            if let Ok(value) = &result {
                inner
                    .entries()
                    .insert(fetch_key.clone(), Entry::fresh(Arc::clone(value)));
            }
            inner.in_flight().remove(&fetch_key);
            result
        }
        .boxed();

        let shared = fetch.shared();
        in_flight.insert(key, shared.clone());
        shared
    }

    /// Cached value for `key`, fresh or stale, without fetching.
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        match self.lookup::<T>(key) {
            Lookup::Fresh(value) | Lookup::Stale(value) => Some(value),
            Lookup::Missing => None,
        }
    }

    /// Stores `value` under `key` as freshly fetched.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        tracing::trace!(key = %key, "Priming cache entry");
        self.inner
            .entries()
            .insert(key, Entry::fresh(Arc::new(value)));
    }

    /// Marks every entry under `prefix` stale. Never refetches.
    /// Returns the number of entries marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for (key, entry) in self.inner.entries().iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                marked += 1;
            }
        }
        tracing::debug!(prefix = %prefix, marked, "Queries invalidated");
        marked
    }

    /// Drops every entry under `prefix`. Returns the number removed.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        tracing::debug!(prefix = %prefix, removed, "Queries removed");
        removed
    }

    /// True when `key` is missing, marked stale or older than the stale time.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.inner
            .entries()
            .get(key)
            .map_or(true, |entry| self.inner.is_entry_stale(entry))
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
