use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::ApiError;

/// Identity of a cached read: endpoint path plus its query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    path: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

type Slot = Arc<OnceCell<Value>>;

/// Shared in-memory cache of query responses.
///
/// Concurrent lookups of a key that is not cached yet wait on a single
/// in-flight fetch. Failed fetches leave the slot empty so the next lookup
/// tries again.
#[derive(Debug, Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Slot>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.clone()).or_default().clone()
        };

        if let Some(value) = slot.get() {
            debug!(path = key.path(), "query cache hit");
            return Ok(value.clone());
        }

        debug!(path = key.path(), "query cache miss");
        let value = slot.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }

    /// Drops the entry for `key`, returning whether anything was cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .remove(key)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Drops every entry whose path starts with `prefix`, whatever its params.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|key, _| !key.path.starts_with(prefix));
        before - slots.len()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).map(|slot| slot.initialized()).unwrap_or(false)
    }
}
