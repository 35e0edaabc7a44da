//! In-process stub of the experiments backend for integration tests.
//!
//! Serves the same envelope shapes as the real API on an ephemeral port and
//! counts requests so tests can assert cache hits and suppressed sends.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Clone, Default)]
pub struct StubState {
    pub assign_calls: Arc<AtomicUsize>,
    pub convert_calls: Arc<AtomicUsize>,
    pub fail_assign: Arc<AtomicBool>,
    pub fail_convert: Arc<AtomicBool>,
    pub fail_admin: Arc<AtomicBool>,
}

pub struct StubBackend {
    pub state: StubState,
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/ab/assign/:experiment_id", post(assign))
            .route("/api/ab/convert", post(convert))
            .route(
                "/api/ab/experiments",
                get(list_experiments).post(create_experiment),
            )
            .route("/api/ab/experiments/:experiment_id/status", put(update_status))
            .route("/api/ab/results/:experiment_id", get(results))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr, handle }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api/ab", self.addr)
    }

    /// Stop serving. The address keeps refusing connections afterwards,
    /// which is how tests simulate an offline backend.
    pub fn shutdown(self) -> SocketAddr {
        self.handle.abort();
        self.addr
    }
}

async fn assign(
    State(state): State<StubState>,
    Path(experiment_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.assign_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_assign.load(Ordering::SeqCst) {
        return Json(json!({
            "status": "error",
            "error": "Experiment not found or not active"
        }));
    }

    let user_id = body.get("user_id").and_then(Value::as_str).unwrap_or_default();
    let variant = if experiment_id == "hero-test" {
        "variant_a"
    } else {
        "control"
    };
    Json(json!({
        "status": "success",
        "variant": variant,
        "user_id": user_id,
        "existing_assignment": false
    }))
}

async fn convert(State(state): State<StubState>, Json(_body): Json<Value>) -> Json<Value> {
    state.convert_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_convert.load(Ordering::SeqCst) {
        return Json(json!({
            "status": "error",
            "error": "Failed to track conversion"
        }));
    }
    Json(json!({
        "status": "success",
        "message": "Conversion tracked successfully"
    }))
}

async fn list_experiments(State(state): State<StubState>) -> Json<Value> {
    if state.fail_admin.load(Ordering::SeqCst) {
        return Json(json!({
            "status": "error",
            "error": "Failed to get experiments"
        }));
    }
    Json(json!({
        "status": "success",
        "experiments": [{
            "id": "exp-1",
            "name": "Hero copy",
            "description": "Test the hero headline",
            "variants": ["control", "variant_a"],
            "traffic_split": {"control": 50, "variant_a": 50},
            "status": "active",
            "created_at": "2025-08-01 12:00:00",
            "start_date": null,
            "end_date": null
        }]
    }))
}

async fn create_experiment(Json(body): Json<Value>) -> Json<Value> {
    let total: u64 = body
        .get("traffic_split")
        .and_then(Value::as_object)
        .map(|split| split.values().filter_map(Value::as_u64).sum())
        .unwrap_or(0);
    if total != 100 {
        return Json(json!({
            "status": "error",
            "error": "Traffic split must add up to 100%"
        }));
    }
    Json(json!({
        "status": "success",
        "message": "Experiment created successfully",
        "experiment_id": "exp-new"
    }))
}

async fn update_status(
    Path(experiment_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    match body.get("status").and_then(Value::as_str) {
        Some("draft" | "active" | "paused" | "completed") => Json(json!({
            "status": "success",
            "message": format!("Experiment {experiment_id} status updated")
        })),
        _ => Json(json!({"status": "error", "error": "Invalid status"})),
    }
}

async fn results(Path(experiment_id): Path<String>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "experiment_id": experiment_id,
        "experiment_name": "Hero copy",
        "total_assignments": 120,
        "total_conversions": 18,
        "results": {
            "control": {
                "assignments": 60,
                "conversions": 6,
                "conversion_rate": 10.0,
                "total_value": 6.0,
                "avg_value": 1.0
            },
            "variant_a": {
                "assignments": 60,
                "conversions": 12,
                "conversion_rate": 20.0,
                "total_value": 18.0,
                "avg_value": 1.5
            }
        }
    }))
}
