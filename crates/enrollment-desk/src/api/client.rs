use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::cache::{QueryCache, QueryKey};
use super::error::ApiError;
use super::transport::Transport;

/// `{ "data": ... }` wrapper most list and detail endpoints respond with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Cache entries a successful mutation makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Key(QueryKey),
    Prefix(String),
}

/// Transport plus query cache: reads go through the cache, writes invalidate it.
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    cache: QueryCache,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: QueryCache::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Cached read decoded straight into `R`.
    pub async fn query<R: DeserializeOwned>(&self, key: &QueryKey) -> Result<R, ApiError> {
        let params = key.params();
        let value = self
            .cache
            .get_or_fetch(key, || self.transport.get(key.path(), &params))
            .await?;
        decode(key.path(), value)
    }

    /// Cached read of an endpoint that wraps its payload in `{ data }`.
    pub async fn query_data<R: DeserializeOwned>(&self, key: &QueryKey) -> Result<R, ApiError> {
        let envelope: Envelope<R> = self.query(key).await?;
        Ok(envelope.data)
    }

    /// Drops the cached entry and reads it again from the server.
    pub async fn refetch_data<R: DeserializeOwned>(&self, key: &QueryKey) -> Result<R, ApiError> {
        self.cache.invalidate(key);
        self.query_data(key).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        invalidates: &[Invalidation],
    ) -> Result<Value, ApiError> {
        let response = self.transport.post(path, body).await?;
        self.apply(invalidates);
        Ok(response)
    }

    pub async fn patch(
        &self,
        path: &str,
        body: &Value,
        invalidates: &[Invalidation],
    ) -> Result<Value, ApiError> {
        let response = self.transport.patch(path, body).await?;
        self.apply(invalidates);
        Ok(response)
    }

    pub async fn delete(&self, path: &str, invalidates: &[Invalidation]) -> Result<Value, ApiError> {
        let response = self.transport.delete(path).await?;
        self.apply(invalidates);
        Ok(response)
    }

    fn apply(&self, invalidates: &[Invalidation]) {
        for invalidation in invalidates {
            match invalidation {
                Invalidation::Key(key) => {
                    let dropped = self.cache.invalidate(key);
                    debug!(path = key.path(), dropped, "invalidated cached query");
                }
                Invalidation::Prefix(prefix) => {
                    let dropped = self.cache.invalidate_prefix(prefix);
                    debug!(%prefix, dropped, "invalidated cached queries by prefix");
                }
            }
        }
    }
}

fn decode<R: DeserializeOwned>(path: &str, value: Value) -> Result<R, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}
