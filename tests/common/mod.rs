#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use igazolas::api::{ApiHttpClient, Credentials};
use igazolas::config::ClientConfig;

pub const GOOD_TOKEN: &str = "good-token";

#[derive(Default)]
pub struct MockState {
    pub registered: AtomicBool,
    pub cached_calls: AtomicUsize,
    pub live_calls: AtomicUsize,
    pub config: Mutex<serde_json::Map<String, Value>>,
    pub config_reload_fails: AtomicBool,
    pub config_fetches: AtomicUsize,
    pub last_query: Mutex<Option<String>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self, credentials: Credentials) -> ApiHttpClient {
        let config = ClientConfig::new(self.url());
        ApiHttpClient::new(&config, credentials).expect("client")
    }
}

pub async fn spawn_mock() -> MockBackend {
    let state = Arc::new(MockState::default());
    state.registered.store(true, Ordering::SeqCst);
    {
        let mut config = state.config.lock().unwrap();
        config.insert("max_excuse_days".to_string(), json!(3));
        config.insert("maintenance".to_string(), json!(false));
    }

    let app = Router::new()
        .route("/api/schedule", get(schedule))
        .route("/api/profile", get(profile))
        .route("/api/igazolasok", get(list_igazolasok).post(create_igazolas))
        .route("/api/igazolasok/{id}", get(get_igazolas).delete(delete_igazolas))
        .route("/api/igazolasok/{id}/review", post(review_igazolas))
        .route("/api/ftv/registration-status", get(registration_status))
        .route("/api/ftv/mulasztasok", get(mulasztasok))
        .route("/api/ftv/sync-metadata/{kind}", get(sync_metadata))
        .route("/api/ftv/sync/{kind}", post(trigger_sync))
        .route("/api/notifications", get(notifications))
        .route("/api/config", get(fetch_config).patch(update_config))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockBackend { addr, state }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", GOOD_TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "invalid token" }))).into_response()
}

pub fn igazolas_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "student_id": 42,
        "student_name": "Kiss Anna",
        "class_id": 5,
        "from_date": "2025-11-03",
        "to_date": "2025-11-04",
        "igazolas_type": "medical",
        "reason": "flu",
        "status": status,
        "teacher_note": null,
        "created_at": "2025-11-05T08:00:00Z",
        "updated_at": "2025-11-05T08:00:00Z"
    })
}

#[derive(Deserialize)]
struct ScheduleQuery {
    from_date: String,
    to_date: String,
}

async fn schedule(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(q): Query<ScheduleQuery>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    *state.last_query.lock().unwrap() = Some(format!("{}..{}", q.from_date, q.to_date));
    Json(json!({
        "breaks": [
            { "from_date": "2025-12-22", "to_date": "2026-01-06", "break_type": "winter" }
        ],
        "overrides": [
            { "date": "2025-11-03", "is_required": false, "class_id": 5, "reason": "class trip" },
            { "date": "2025-11-03", "is_required": true, "class_id": null, "reason": "make-up day" }
        ]
    }))
    .into_response()
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 42,
        "name": "Kiss Anna",
        "email": "anna@example.com",
        "role": "student",
        "student_class": { "id": 5, "name": "11.B" }
    }))
    .into_response()
}

async fn list_igazolasok(headers: HeaderMap, Query(q): Query<serde_json::Map<String, Value>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut results = vec![igazolas_json(1, "pending"), igazolas_json(2, "approved")];
    if let Some(Value::String(status)) = q.get("status") {
        results.retain(|r| r["status"] == *status);
    }
    Json(json!({ "count": results.len(), "results": results })).into_response()
}

async fn get_igazolas(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id == 1 {
        Json(igazolas_json(1, "pending")).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))).into_response()
    }
}

async fn create_igazolas(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut created = igazolas_json(7, "pending");
    created["reason"] = body["reason"].clone();
    created["from_date"] = body["from_date"].clone();
    created["to_date"] = body["to_date"].clone();
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn delete_igazolas(headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn review_igazolas(headers: HeaderMap, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let status = if body["decision"] == "approve" { "approved" } else { "rejected" };
    let mut reviewed = igazolas_json(id, status);
    reviewed["teacher_note"] = body.get("teacher_note").cloned().unwrap_or(Value::Null);
    Json(reviewed).into_response()
}

async fn registration_status(State(state): State<Arc<MockState>>) -> Response {
    Json(json!({ "registered": state.registered.load(Ordering::SeqCst) })).into_response()
}

#[derive(Deserialize)]
struct ModeQuery {
    mode: String,
}

fn mulasztas_json(i: usize) -> Value {
    json!({
        "id": format!("m-{}", i),
        "date": "2025-10-15",
        "period": (i % 8) + 1,
        "subject": "matematika",
        "kind": "absence",
        "excused": false
    })
}

async fn mulasztasok(State(state): State<Arc<MockState>>, Query(q): Query<ModeQuery>) -> Response {
    let count = if q.mode == "live" {
        state.live_calls.fetch_add(1, Ordering::SeqCst);
        3
    } else {
        state.cached_calls.fetch_add(1, Ordering::SeqCst);
        2
    };
    Json((0..count).map(mulasztas_json).collect::<Vec<_>>()).into_response()
}

async fn sync_metadata(Path(kind): Path<String>) -> Response {
    Json(json!({
        "last_sync_time": "2025-10-15T06:30:00Z",
        "last_sync_status": "success",
        "sync_type": kind
    }))
    .into_response()
}

async fn trigger_sync(Path(kind): Path<String>) -> Response {
    if kind == "class" {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": "FTV unavailable" })),
        )
            .into_response();
    }
    Json(json!({
        "last_sync_time": "2025-10-15T07:00:00Z",
        "last_sync_status": "success",
        "sync_type": kind
    }))
    .into_response()
}

async fn notifications() -> Response {
    Json(json!([
        { "id": "n1", "title": "Maintenance", "message": "Tonight 22:00", "severity": "warning" },
        { "id": "n2", "title": "Welcome", "message": "New school year", "severity": "info" }
    ]))
    .into_response()
}

async fn fetch_config(State(state): State<Arc<MockState>>) -> Response {
    state.config_fetches.fetch_add(1, Ordering::SeqCst);
    if state.config_reload_fails.load(Ordering::SeqCst) && state.config_fetches.load(Ordering::SeqCst) > 1 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(Value::Object(state.config.lock().unwrap().clone())).into_response()
}

async fn update_config(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let key = body["key"].as_str().unwrap_or_default().to_string();
    if key == "locked" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "locked keys cannot change" })),
        )
            .into_response();
    }
    state.config.lock().unwrap().insert(key, body["value"].clone());
    StatusCode::NO_CONTENT.into_response()
}
