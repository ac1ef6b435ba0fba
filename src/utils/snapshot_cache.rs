use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Last successful listing of a collection, kept for the
/// "search failed, showing local results" fallback.
///
/// Owned by application state, not a global.
pub struct SnapshotCache<T> {
    cache: Cache<&'static str, Arc<Vec<T>>>,
}

impl<T: Send + Sync + 'static> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(16) // one entry per collection
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn store(&self, collection: &'static str, rows: Vec<T>) {
        self.cache.insert(collection, Arc::new(rows)).await;
    }

    pub async fn get(&self, collection: &'static str) -> Option<Arc<Vec<T>>> {
        self.cache.get(&collection).await
    }
}
