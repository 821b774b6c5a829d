//! End-to-end admission review over HTTP against a stub backend bound to a
//! loopback port.

mod stub {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    pub(super) const COOKIE: &str = "desk_session=abc123";

    #[derive(Debug, Default)]
    pub(super) struct Backend {
        pub students: Vec<Value>,
        pub enrollments: Vec<Value>,
        pub pending_reads: usize,
        pub status_posts: Vec<(String, Value)>,
    }

    pub(super) type Shared = Arc<Mutex<Backend>>;

    fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        let cookie = headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if cookie == COOKIE {
            Ok(())
        } else {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            ))
        }
    }

    async fn me(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        authorized(&headers)?;
        Ok(Json(json!({
            "data": {
                "id": "admin-1",
                "name": "Mona",
                "role": {
                    "id": "role-1",
                    "name": "Registrar",
                    "permissions": [{ "code": "ACCEPT_STUDENT" }, { "code": "READ_STUDENT" }]
                }
            }
        })))
    }

    async fn pending_students(
        State(backend): State<Shared>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        authorized(&headers)?;
        let mut backend = backend.lock().expect("backend lock");
        backend.pending_reads += 1;
        let data: Vec<Value> = backend
            .students
            .iter()
            .filter(|row| row["status"] == "pending")
            .cloned()
            .collect();
        Ok(Json(json!({ "data": data })))
    }

    async fn student_status(
        State(backend): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        authorized(&headers)?;
        let mut backend = backend.lock().expect("backend lock");
        backend
            .status_posts
            .push((format!("/students/{id}/status"), body.clone()));
        match backend.students.iter_mut().find(|row| row["id"] == id.as_str()) {
            Some(row) => {
                row["status"] = body["status"].clone();
                Ok(Json(json!({ "message": "updated" })))
            }
            None => Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "message": ["Student not found"] })),
            )),
        }
    }

    async fn pending_enrollments(
        State(backend): State<Shared>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        authorized(&headers)?;
        let backend = backend.lock().expect("backend lock");
        Ok(Json(json!({ "data": backend.enrollments })))
    }

    async fn enrollment_status(
        State(backend): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        authorized(&headers)?;
        let mut backend = backend.lock().expect("backend lock");
        backend
            .status_posts
            .push((format!("/enrollments/{id}/status"), body));
        Err((
            StatusCode::CONFLICT,
            Json(json!({ "errors": [{ "message": "Enrollment already processed" }] })),
        ))
    }

    pub(super) fn router(backend: Shared) -> Router {
        Router::new()
            .route("/api/auth/me", get(me))
            .route("/api/students/status/pending/list", get(pending_students))
            .route("/api/students/:id/status", post(student_status))
            .route("/api/enrollments/pending", get(pending_enrollments))
            .route("/api/enrollments/:id/status", post(enrollment_status))
            .with_state(backend)
    }
}

use std::sync::{Arc, Mutex};

use serde_json::json;

use enrollment_desk::api::{ApiClient, HttpTransport};
use enrollment_desk::config::{ApiConfig, ReviewConfig};
use enrollment_desk::load_session;
use enrollment_desk::workflows::admission::{AdmissionDesk, ReviewOutcome};
use enrollment_desk::workflows::domain::RecordId;
use enrollment_desk::workflows::WorkflowError;

async fn spawn_backend(backend: stub::Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, stub::router(backend))
            .await
            .expect("stub backend runs");
    });
    format!("http://{addr}/api")
}

fn seeded() -> stub::Shared {
    let backend = stub::Backend {
        students: vec![
            json!({ "id": "s-1", "name": "Amal", "status": "pending" }),
            json!({ "id": "s-2", "name": "Bilal", "status": "pending" }),
            json!({ "id": "s-3", "name": "Dana", "status": "pending" }),
        ],
        enrollments: vec![json!({
            "id": "e-1",
            "status": "pending",
            "studentId": { "_id": "s-1", "id": "s-1", "name": "Amal" }
        })],
        ..stub::Backend::default()
    };
    Arc::new(Mutex::new(backend))
}

fn client(base_url: &str, cookie: Option<&str>) -> Arc<ApiClient<HttpTransport>> {
    let config =
        ApiConfig::new(base_url, cookie.map(str::to_string)).expect("loopback url parses");
    let transport = HttpTransport::new(&config).expect("http client builds");
    Arc::new(ApiClient::new(transport))
}

#[tokio::test]
async fn rejecting_a_student_round_trips_through_http() {
    let backend = seeded();
    let base_url = spawn_backend(backend.clone()).await;
    let api = client(&base_url, Some(stub::COOKIE));

    let session = load_session(&api).await.expect("session resolves");
    assert_eq!(session.admin().name, "Mona");

    let desk = AdmissionDesk::new(api, &ReviewConfig::default());
    let before = desk.pending_students(&session).await.expect("pending list");
    assert_eq!(before.len(), 3);

    let outcome = desk
        .reject_student(&session, &RecordId::new("s-2"), "وثائق ناقصة")
        .await
        .expect("rejection stored");

    let remaining: Vec<&str> = outcome.remaining().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(remaining, ["s-1", "s-3"]);

    let backend = backend.lock().expect("backend lock");
    assert_eq!(backend.pending_reads, 2);
    assert_eq!(
        backend.status_posts,
        vec![(
            "/students/s-2/status".to_string(),
            json!({ "status": "rejected", "reason": "وثائق ناقصة" })
        )]
    );
}

#[tokio::test]
async fn server_messages_reach_the_banner_verbatim() {
    let backend = seeded();
    let base_url = spawn_backend(backend.clone()).await;
    let api = client(&base_url, Some(stub::COOKIE));
    let session = load_session(&api).await.expect("session resolves");
    let desk = AdmissionDesk::new(api, &ReviewConfig::default());

    let missing = desk
        .accept_student(&session, &RecordId::new("s-404"), &true)
        .await
        .expect_err("unknown student");
    assert_eq!(missing.banner(), "Student not found");

    let conflict = desk
        .reject_enrollment(&session, &RecordId::new("e-1"), "duplicate request")
        .await
        .expect_err("already processed");
    assert_eq!(conflict.banner(), "Enrollment already processed");
    assert!(matches!(conflict, WorkflowError::Api(ref err) if err.status() == Some(409)));
}

#[tokio::test]
async fn missing_cookie_is_rejected_by_the_backend() {
    let base_url = spawn_backend(seeded()).await;
    let api = client(&base_url, None);

    let err = load_session(&api).await.expect_err("no cookie, no session");
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Unauthorized");
}

#[tokio::test]
async fn declined_confirmation_leaves_backend_untouched() {
    let backend = seeded();
    let base_url = spawn_backend(backend.clone()).await;
    let api = client(&base_url, Some(stub::COOKIE));
    let session = load_session(&api).await.expect("session resolves");
    let desk = AdmissionDesk::new(api, &ReviewConfig::default());

    let outcome = desk
        .accept_student(&session, &RecordId::new("s-1"), &false)
        .await
        .expect("cancelled");
    assert_eq!(outcome, ReviewOutcome::Cancelled);
    assert!(backend.lock().expect("backend lock").status_posts.is_empty());
}
