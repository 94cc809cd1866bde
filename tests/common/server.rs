//! Fake request-status API
//!
//! Serves `GET /estudiantes/solicitudes?id_estudiante=` from in-memory state
//! that tests mutate between polls. Each instance listens on its own random port.

use super::constants::*;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct ApiState {
    requests: HashMap<String, Vec<Value>>,
    failing: bool,
    raw_body: Option<String>,
    hits: Vec<String>,
}

type SharedApiState = Arc<Mutex<ApiState>>;

async fn list_requests(
    State(state): State<SharedApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let student_id = params.get("id_estudiante").cloned().unwrap_or_default();
    state.hits.push(student_id.clone());

    if state.failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
    }
    if let Some(body) = &state.raw_body {
        return (StatusCode::OK, body.clone()).into_response();
    }

    let requests = state.requests.get(&student_id).cloned().unwrap_or_default();
    Json(requests).into_response()
}

/// Fake API instance. Shuts down when dropped.
pub struct FakeRequestApi {
    /// Base URL for the notifier (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: SharedApiState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeRequestApi {
    /// Spawns the fake API on a random port and waits until it answers.
    pub async fn spawn() -> Self {
        let state: SharedApiState = Arc::new(Mutex::new(ApiState::default()));
        let app = Router::new()
            .route("/estudiantes/solicitudes", get(list_requests))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake API failed");
        });

        let api = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        };
        api.wait_for_ready().await;
        api.state.lock().unwrap().hits.clear();
        api
    }

    /// Replace the request list served for `student_id`.
    pub fn set_requests(&self, student_id: &str, requests: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state.requests.insert(student_id.to_string(), requests);
        state.raw_body = None;
    }

    /// Make every call fail with 503 until cleared.
    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Serve this exact body with status 200, bypassing the request lists.
    #[allow(dead_code)]
    pub fn set_raw_body(&self, body: &str) {
        self.state.lock().unwrap().raw_body = Some(body.to_string());
    }

    /// Student ids of every call received so far.
    #[allow(dead_code)]
    pub fn hits(&self) -> Vec<String> {
        self.state.lock().unwrap().hits.clone()
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);
        let url = format!("{}/estudiantes/solicitudes", self.base_url);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Fake API did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(&url).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for FakeRequestApi {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
