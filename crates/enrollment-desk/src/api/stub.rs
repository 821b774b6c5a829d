//! Canned-response transport for unit tests outside the admission desk.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{ApiError, Transport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Answers every request on a path with the same JSON value; unknown paths
/// answer `null`.
#[derive(Debug, Default)]
pub(crate) struct StubTransport {
    responses: Mutex<HashMap<String, Value>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl StubTransport {
    pub(crate) fn respond(self, path: &str, value: Value) -> Self {
        self.set(path, value);
        self
    }

    pub(crate) fn set(&self, path: &str, value: Value) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(path.to_string(), value);
    }

    pub(crate) fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().expect("recorded lock").clone()
    }

    fn answer(
        &self,
        method: &'static str,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Value {
        self.recorded.lock().expect("recorded lock").push(Recorded {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body: body.cloned(),
        });
        self.responses
            .lock()
            .expect("responses lock")
            .get(path)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl Transport for StubTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        Ok(self.answer("GET", path, query, None))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        Ok(self.answer("POST", path, &[], Some(body)))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        Ok(self.answer("PATCH", path, &[], Some(body)))
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        Ok(self.answer("DELETE", path, &[], None))
    }
}
