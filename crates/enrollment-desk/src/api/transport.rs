#![allow(async_fn_in_trait)]

use serde_json::Value;

use super::error::ApiError;

/// Raw JSON exchange with the back-office API.
///
/// Paths are absolute API paths such as `/enrollments/pending`; query pairs
/// are appended as given.
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}
