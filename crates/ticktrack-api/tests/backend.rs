//! Drives `ApiClient` against an in-process axum backend and checks the
//! paths, methods and bodies it sends.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use ticktrack_api::{Api, ApiClient, ApiError, TaskCreate, UserCreate};

#[derive(Clone, Default)]
struct Backend {
    requests: Arc<Mutex<Vec<(String, String, Value)>>>,
}

impl Backend {
    fn record(&self, method: &str, path: String, body: Value) {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_owned(), path, body));
    }

    fn requests(&self) -> Vec<(String, String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

fn task_json(id: &str, elapsed: u64, running: bool) -> Value {
    json!({
        "id": id,
        "userId": "u1",
        "name": "Write report",
        "description": "quarterly",
        "elapsedTime": elapsed,
        "isRunning": running
    })
}

async fn get_task(State(b): State<Backend>, Path(id): Path<String>) -> impl IntoResponse {
    b.record("GET", format!("/tasks/{id}"), Value::Null);
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "no such task" })));
    }
    (StatusCode::OK, Json(task_json(&id, 100, false)))
}

async fn patch_task(
    State(b): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    b.record("PATCH", format!("/tasks/{id}"), body.clone());
    if body.get("toggle").is_some() {
        return (StatusCode::OK, Json(task_json(&id, 100, true)));
    }
    let elapsed = body["elapsedTime"].as_u64().unwrap_or(0);
    (StatusCode::OK, Json(task_json(&id, elapsed, false)))
}

async fn delete_task(State(b): State<Backend>, Path(id): Path<String>) -> StatusCode {
    b.record("DELETE", format!("/tasks/{id}"), Value::Null);
    StatusCode::NO_CONTENT
}

async fn tasks_for_user(State(b): State<Backend>, Path(user): Path<String>) -> Json<Value> {
    b.record("GET", format!("/tasks/user/{user}"), Value::Null);
    Json(json!([task_json("t1", 10, false), task_json("t2", 20, true)]))
}

async fn create_task(State(b): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
    b.record("POST", "/tasks".to_owned(), body.clone());
    let mut task = task_json("t9", 0, false);
    task["name"] = body["name"].clone();
    (StatusCode::CREATED, Json(task))
}

async fn user_by_email(State(b): State<Backend>, Path(email): Path<String>) -> impl IntoResponse {
    b.record("GET", format!("/users/email/{email}"), Value::Null);
    if email == "ana@example.com" {
        return (
            StatusCode::OK,
            Json(json!({ "id": "u1", "name": "Ana", "email": email })),
        );
    }
    (StatusCode::NOT_FOUND, Json(json!({})))
}

async fn create_user(State(b): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
    b.record("POST", "/users".to_owned(), body);
    (StatusCode::CONFLICT, Json(json!({ "error": "duplicate key" })))
}

async fn start_backend() -> (ApiClient, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(patch_task).delete(delete_task),
        )
        .route("/api/tasks/user/{user_id}", get(tasks_for_user))
        .route("/api/tasks", post(create_task))
        .route("/api/users/email/{email}", get(user_by_email))
        .route("/api/users", post(create_user))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Api::new()
        .set_base_url(format!("http://{addr}/api"))
        .no_proxy()
        .build()
        .unwrap();
    (client, backend)
}

#[tokio::test]
async fn update_time_sends_single_field_patch() {
    let (client, backend) = start_backend().await;

    let task = client.update_time("t1", 105).await.unwrap();
    assert_eq!(task.elapsed_time, 105);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "PATCH");
    assert_eq!(requests[0].1, "/tasks/t1");
    assert_eq!(requests[0].2, json!({ "elapsedTime": 105 }));
}

#[tokio::test]
async fn toggle_sends_toggle_flag_and_returns_task() {
    let (client, backend) = start_backend().await;

    let task = client.toggle_running("t1").await.unwrap();
    assert!(task.is_running);
    assert_eq!(backend.requests()[0].2, json!({ "toggle": true }));
}

#[tokio::test]
async fn missing_task_maps_to_not_found() {
    let (client, _backend) = start_backend().await;

    let err = client.get_task("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "task not found");
}

#[tokio::test]
async fn lists_tasks_for_user_and_deletes() {
    let (client, backend) = start_backend().await;

    let tasks = client.tasks_for_user("u1").await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks[1].is_running);

    client.delete_task("t1").await.unwrap();

    let paths: Vec<_> = backend.requests().into_iter().map(|r| (r.0, r.1)).collect();
    assert_eq!(
        paths,
        vec![
            ("GET".to_owned(), "/tasks/user/u1".to_owned()),
            ("DELETE".to_owned(), "/tasks/t1".to_owned()),
        ]
    );
}

#[tokio::test]
async fn create_task_posts_camel_case_body() {
    let (client, backend) = start_backend().await;

    let created = client
        .create_task(&TaskCreate {
            user_id: "u1".into(),
            name: "Plan sprint".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(created.name, "Plan sprint");
    assert_eq!(
        backend.requests()[0].2,
        json!({ "userId": "u1", "name": "Plan sprint", "description": "" })
    );
}

#[tokio::test]
async fn invalid_form_is_rejected_before_sending() {
    let (client, backend) = start_backend().await;

    let err = client
        .create_task(&TaskCreate {
            user_id: "u1".into(),
            name: "ab".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn login_lookup_and_duplicate_registration() {
    let (client, _backend) = start_backend().await;

    let user = client.user_by_email("ana@example.com").await.unwrap();
    assert_eq!(user.id, "u1");

    let err = client.user_by_email("bob@example.com").await.unwrap_err();
    assert_eq!(err.to_string(), "user not found");

    let err = client
        .create_user(&UserCreate {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "email already in use");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let client = Api::new()
        .set_base_url("http://127.0.0.1:1/api")
        .set_timeout_secs(2)
        .no_proxy()
        .build()
        .unwrap();

    let err = client.get_task("t1").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}
