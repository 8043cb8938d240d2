use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::staleness::is_data_stale;

/// In-memory store for dashboard snapshots keyed by feed name
/// ("analysis:AAPL", "news", ...), with a side table of last-fetch
/// timestamps the daily refresh policy is evaluated against.
///
/// Entries also carry a generous TTL so snapshots nobody refreshes do not
/// outlive two refresh windows. Durable persistence of the
/// `{data, timestamp}` pairs belongs to the caller.
pub struct DashboardCache {
    snapshots: Cache<String, Value>,
    last_fetch_ms: Arc<RwLock<HashMap<String, i64>>>,
}

impl DashboardCache {
    pub fn new() -> Self {
        let snapshots = Cache::builder()
            .time_to_live(Duration::from_secs(48 * 60 * 60))
            .build();

        Self {
            snapshots,
            last_fetch_ms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.snapshots.get(key).await
    }

    /// Store a freshly fetched snapshot and record the fetch time.
    pub async fn insert(&self, key: String, value: Value) {
        self.snapshots.insert(key.clone(), value).await;

        let mut last_fetch = self.last_fetch_ms.write().await;
        last_fetch.insert(key, Utc::now().timestamp_millis());
    }

    /// Whether the feed should be re-fetched under the daily 03:00 cutoff.
    pub async fn needs_refresh(&self, key: &str) -> bool {
        let last_fetch = self.last_fetch_ms.read().await;
        is_data_stale(last_fetch.get(key).copied())
    }

    pub async fn last_fetch(&self, key: &str) -> Option<i64> {
        let last_fetch = self.last_fetch_ms.read().await;
        last_fetch.get(key).copied()
    }

    /// Seed fetch timestamps restored by the caller's persistence layer.
    pub async fn initialize_fetch_state(&self, state: HashMap<String, i64>) {
        let mut last_fetch = self.last_fetch_ms.write().await;
        last_fetch.extend(state);
    }
}

impl Default for DashboardCache {
    fn default() -> Self {
        Self::new()
    }
}
