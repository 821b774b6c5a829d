use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::api::{ApiClient, ApiError, Transport};
use crate::config::ReviewConfig;
use crate::session::{AdminProfile, Permission, Session};
use crate::workflows::admission::AdmissionDesk;
use crate::workflows::domain::RecordId;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Call {
    Get(String),
    Post(String, Value),
    Patch(String, Value),
    Delete(String),
}

#[derive(Debug, Default)]
struct BackendState {
    students: Vec<Value>,
    enrollments: Vec<Value>,
    calls: Vec<Call>,
    failures: HashMap<String, ApiError>,
}

/// In-memory stand-in for the REST backend: records every call and applies
/// status changes to its own store so refetches reflect them.
#[derive(Debug, Clone, Default)]
pub(super) struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingBackend {
    pub(super) fn with_students(students: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().expect("backend state");
            state.students = students
                .iter()
                .map(|(id, name)| json!({ "id": id, "name": name, "status": "pending" }))
                .collect();
        }
        backend
    }

    pub(super) fn add_enrollment(&self, id: &str, student_id: &str, student_name: &str) {
        let mut state = self.state.lock().expect("backend state");
        state.enrollments.push(json!({
            "id": id,
            "status": "pending",
            "studentId": { "id": student_id, "name": student_name },
            "courseId": { "id": 4, "name": "Tajweed I" }
        }));
    }

    pub(super) fn fail_on(&self, path: &str, error: ApiError) {
        let mut state = self.state.lock().expect("backend state");
        state.failures.insert(path.to_string(), error);
    }

    pub(super) fn calls(&self) -> Vec<Call> {
        self.state.lock().expect("backend state").calls.clone()
    }

    pub(super) fn posts(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post(path, body) => Some((path, body)),
                _ => None,
            })
            .collect()
    }

    pub(super) fn patches(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Patch(path, body) => Some((path, body)),
                _ => None,
            })
            .collect()
    }

    pub(super) fn gets_of(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Get(p) if p == path))
            .count()
    }

    fn take_failure(state: &mut BackendState, path: &str) -> Option<ApiError> {
        state.failures.remove(path)
    }
}

fn pending(rows: &[Value]) -> Value {
    let data: Vec<Value> = rows
        .iter()
        .filter(|row| row["status"] == "pending")
        .cloned()
        .collect();
    json!({ "data": data })
}

fn apply_status(rows: &mut [Value], id: &str, body: &Value) {
    if let Some(row) = rows.iter_mut().find(|row| row["id"] == id) {
        row["status"] = body["status"].clone();
        if let Some(reason) = body.get("reason") {
            row["rejectionReason"] = reason.clone();
        }
    }
}

impl Transport for RecordingBackend {
    async fn get(&self, path: &str, _query: &[(String, String)]) -> Result<Value, ApiError> {
        let mut state = self.state.lock().expect("backend state");
        state.calls.push(Call::Get(path.to_string()));
        if let Some(error) = Self::take_failure(&mut state, path) {
            return Err(error);
        }

        if path == "/students/status/pending/list" {
            return Ok(pending(&state.students));
        }
        if path == "/enrollments/pending" {
            return Ok(pending(&state.enrollments));
        }
        if let Some(id) = path.strip_prefix("/students/details/") {
            return state
                .students
                .iter()
                .find(|row| row["id"] == id)
                .map(|row| json!({ "data": row }))
                .ok_or_else(|| ApiError::Rejected {
                    path: path.to_string(),
                    status: 404,
                    message: "Student not found".to_string(),
                });
        }
        if let Some(id) = path.strip_prefix("/enrollments/student/") {
            let data: Vec<Value> = state
                .enrollments
                .iter()
                .filter(|row| row["studentId"]["id"] == id)
                .cloned()
                .collect();
            return Ok(json!({ "data": data }));
        }
        Ok(Value::Null)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let mut state = self.state.lock().expect("backend state");
        state.calls.push(Call::Post(path.to_string(), body.clone()));
        if let Some(error) = Self::take_failure(&mut state, path) {
            return Err(error);
        }

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["students", id, "status"] => apply_status(&mut state.students, id, body),
            ["enrollments", id, "status"] => apply_status(&mut state.enrollments, id, body),
            ["enrollments", "create", student_id] => {
                let student_id = student_id.to_string();
                let name = state
                    .students
                    .iter()
                    .find(|row| row["id"] == student_id.as_str())
                    .map(|row| row["name"].clone())
                    .unwrap_or(Value::Null);
                let id = format!("e-{}", state.enrollments.len() + 1);
                state.enrollments.push(json!({
                    "id": id,
                    "status": "pending",
                    "studentId": { "id": student_id, "name": name },
                    "courseId": { "id": body["courseId"], "name": "Tajweed I" }
                }));
            }
            _ => {}
        }
        Ok(json!({ "message": "ok" }))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let mut state = self.state.lock().expect("backend state");
        state.calls.push(Call::Patch(path.to_string(), body.clone()));
        if let Some(error) = Self::take_failure(&mut state, path) {
            return Err(error);
        }

        if let Some(id) = path.strip_prefix("/enrollments/update/") {
            if let Some(row) = state.enrollments.iter_mut().find(|row| row["id"] == id) {
                if let Some(status) = body.get("status") {
                    row["status"] = status.clone();
                }
            }
        }
        Ok(json!({ "message": "ok" }))
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let mut state = self.state.lock().expect("backend state");
        state.calls.push(Call::Delete(path.to_string()));
        Ok(Value::Null)
    }
}

pub(super) fn operator(codes: &[Permission]) -> Session {
    let admin: AdminProfile =
        serde_json::from_value(json!({ "id": "admin-7", "name": "Case Worker" }))
            .expect("admin profile");
    Session::new(admin, codes.iter().map(|permission| permission.code()))
}

pub(super) fn reviewer() -> Session {
    operator(&[
        Permission::AcceptStudent,
        Permission::AcceptEnrollment,
        Permission::ReadStudent,
    ])
}

pub(super) fn desk(backend: &RecordingBackend) -> AdmissionDesk<RecordingBackend> {
    AdmissionDesk::new(
        Arc::new(ApiClient::new(backend.clone())),
        &ReviewConfig::default(),
    )
}

pub(super) fn id(value: &str) -> RecordId {
    RecordId::new(value)
}
