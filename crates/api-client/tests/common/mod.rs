#![allow(dead_code)]

//! In-process stand-in for the monitoring backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::task::JoinHandle;

use vigil_api::{Agent, CreateAgentRequest};
use vigil_api_client::ApiClient;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
/// Accepted by `/login` but never issued a cookie, so the probe fails.
pub const COOKIELESS_USER: &str = "ghost";

#[derive(Default)]
pub struct StubState {
    pub active_session: Mutex<Option<String>>,
    sessions_issued: AtomicUsize,
    pub agents: Mutex<Vec<Agent>>,
    pub selectors: Mutex<Vec<String>>,
    pub export_body: Mutex<String>,
    pub logout_delay: Mutex<Option<Duration>>,
    pub logouts: AtomicUsize,
    /// Label-values requests answered with 503 before succeeding.
    pub label_failures: AtomicUsize,
}

impl StubState {
    /// Forget the live session server-side, as an expiry would.
    pub fn revoke(&self) {
        *self.active_session.lock().unwrap() = None;
    }

    fn has_session(&self, headers: &HeaderMap) -> bool {
        let Some(active) = self.active_session.lock().unwrap().clone() else {
            return false;
        };
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .any(|pair| pair.trim() == format!("id={active}"))
    }
}

pub struct StubBackend {
    pub url: String,
    pub state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/login", post(login))
            .route("/logout", get(logout))
            .route("/agent", get(list_agents).post(create_agent))
            .route("/agent/{id}", delete(delete_agent))
            .route("/vm/label/{label}/values", get(label_values))
            .route("/vm/export", post(export))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend crashed");
        });

        Self {
            url: format!("http://{addr}"),
            state,
            server,
        }
    }

    pub fn client(&self) -> ApiClient {
        self.client_with_timeout(Duration::from_secs(5))
    }

    pub fn client_with_timeout(&self, timeout: Duration) -> ApiClient {
        ApiClient::new(&self.url, timeout).expect("build client")
    }

    pub fn set_export_body(&self, body: String) {
        *self.state.export_body.lock().unwrap() = body;
    }

    pub fn selectors(&self) -> Vec<String> {
        self.state.selectors.lock().unwrap().clone()
    }

    pub fn seed_agent(&self, id: &str, name: &str, token: &str) {
        self.state.agents.lock().unwrap().push(Agent {
            id: id.to_string(),
            name: name.to_string(),
            token: token.to_string(),
            created_at: Some("2025-03-01T12:00:00Z".to_string()),
        });
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Base URL where nothing listens.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

fn to_login() -> Response {
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/login")]).into_response()
}

async fn login(
    State(state): State<Arc<StubState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    match (username, password) {
        (Some(USERNAME), Some(PASSWORD)) => {
            let n = state.sessions_issued.fetch_add(1, Ordering::SeqCst);
            let id = format!("session-{n}");
            *state.active_session.lock().unwrap() = Some(id.clone());
            (
                StatusCode::SEE_OTHER,
                [
                    (header::SET_COOKIE, format!("id={id}; Path=/; HttpOnly")),
                    (header::LOCATION, "/".to_string()),
                ],
            )
                .into_response()
        }
        (Some(COOKIELESS_USER), Some(_)) => {
            (StatusCode::SEE_OTHER, [(header::LOCATION, "/")]).into_response()
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout(State(state): State<Arc<StubState>>) -> Response {
    let delay = *state.logout_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state.logouts.fetch_add(1, Ordering::SeqCst);
    state.revoke();
    (
        StatusCode::SEE_OTHER,
        [
            (header::SET_COOKIE, "id=; Path=/; Max-Age=0"),
            (header::LOCATION, "/login"),
        ],
    )
        .into_response()
}

async fn list_agents(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !state.has_session(&headers) {
        return to_login();
    }
    let agents = state.agents.lock().unwrap().clone();
    Json(agents).into_response()
}

async fn create_agent(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(req): Json<CreateAgentRequest>,
) -> Response {
    if !state.has_session(&headers) {
        return to_login();
    }
    if req.name.is_empty() || req.token.is_empty() {
        return (StatusCode::BAD_REQUEST, Json("Empty argument, check body")).into_response();
    }
    let mut agents = state.agents.lock().unwrap();
    if agents.iter().any(|a| a.name == req.name) {
        return (
            StatusCode::CONFLICT,
            Json("trying to create an element already present"),
        )
            .into_response();
    }
    let id = (agents.len() + 1).to_string();
    agents.push(Agent {
        id,
        name: req.name,
        token: req.token,
        created_at: Some("2025-03-01T12:00:00Z".to_string()),
    });
    (StatusCode::CREATED, Json("created agent.")).into_response()
}

async fn delete_agent(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !state.has_session(&headers) {
        return to_login();
    }
    let mut agents = state.agents.lock().unwrap();
    let before = agents.len();
    agents.retain(|a| a.id != id);
    if agents.len() == before {
        return (StatusCode::NOT_FOUND, Json("agent not found")).into_response();
    }
    Json("deleted agent.").into_response()
}

async fn label_values(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(label): Path<String>,
) -> Response {
    let pending = state.label_failures.load(Ordering::SeqCst);
    if pending > 0 {
        state.label_failures.fetch_sub(1, Ordering::SeqCst);
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if !state.has_session(&headers) {
        return to_login();
    }
    match label.as_str() {
        "__name__" => Json(json!({"status": "success", "data": ["node_load1", "up"]})),
        "job" => Json(json!(["node", "vmagent"])),
        _ => Json(json!({"status": "error"})),
    }
    .into_response()
}

async fn export(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !state.has_session(&headers) {
        return to_login();
    }
    if let Some(selector) = form.get("match[]") {
        state.selectors.lock().unwrap().push(selector.clone());
    }
    let body = state.export_body.lock().unwrap().clone();
    body.into_response()
}
