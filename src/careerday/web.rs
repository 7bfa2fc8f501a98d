//! Browser chat frontend.
//!
//! Only available with the `web` feature. Serves a single HTML page and a small JSON
//! API over the [`SessionStore`]:
//!
//! ```text
//! GET    /                              chat page
//! POST   /api/sessions                  create a session
//! GET    /api/sessions/{id}             session view
//! DELETE /api/sessions/{id}             tear the session down
//! POST   /api/sessions/{id}/start       {"career", "api_key"} -> opening
//! POST   /api/sessions/{id}/messages    {"content"} -> continuation
//! POST   /api/sessions/{id}/summary     end-of-day summary
//! POST   /api/sessions/{id}/reset       back to the career prompt
//! ```
//!
//! Input errors map to `400`, lifecycle conflicts to `409`, unknown sessions to
//! `404` and model failures to `502`. Every error body is `{"error": "..."}`.

use crate::careerday::client_wrapper::Message;
use crate::careerday::session::{ChatSession, ClientFactory, SessionError, SessionStore};
use crate::careerday::simulation::{SimulationPhase, SummaryRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared state of the web frontend.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub factory: Arc<dyn ClientFactory>,
}

impl AppState {
    pub fn new(store: SessionStore, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            store: Arc::new(store),
            factory,
        }
    }
}

/// What the page needs to render a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub phase: SimulationPhase,
    pub career: Option<String>,
    pub time: Option<String>,
    pub scenarios_completed: usize,
    pub max_scenarios: usize,
    pub transcript: Vec<Message>,
    pub summary: Option<SummaryRecord>,
}

impl SessionView {
    fn new(id: &str, session: &ChatSession, max_scenarios: usize) -> Self {
        let simulation = session.simulation();
        Self {
            id: id.to_string(),
            phase: session.phase(),
            career: simulation
                .and_then(|sim| sim.career_knowledge())
                .map(|knowledge| knowledge.career.clone()),
            time: simulation.map(|sim| sim.state().time.clone()),
            scenarios_completed: simulation
                .map(|sim| sim.state().scenarios_completed)
                .unwrap_or(0),
            max_scenarios,
            transcript: session.transcript().to_vec(),
            summary: session.summary().cloned(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub career: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub content: String,
}

/// Reply to a start or message request: the new narrator text and the updated view.
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    pub session: SessionView,
}

#[derive(Debug)]
pub enum WebError {
    SessionNotFound(String),
    Session(SessionError),
}

impl From<SessionError> for WebError {
    fn from(err: SessionError) -> Self {
        WebError::Session(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::SessionNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown session: {}", id))
            }
            WebError::Session(err) => {
                let status = match err {
                    SessionError::EmptyInput
                    | SessionError::MissingCareer
                    | SessionError::MissingApiKey => StatusCode::BAD_REQUEST,
                    SessionError::NotStarted
                    | SessionError::AlreadyStarted
                    | SessionError::SimulationComplete
                    | SessionError::NotComplete => StatusCode::CONFLICT,
                    SessionError::Simulation(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
        };
        if status.is_server_error() {
            log::error!("request failed: {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/start", post(start_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/summary", post(generate_summary))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("careerday web listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn lookup(state: &AppState, id: &str) -> Result<Arc<Mutex<ChatSession>>, WebError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| WebError::SessionNotFound(id.to_string()))
}

fn view(id: &str, session: &ChatSession) -> SessionView {
    SessionView::new(id, session, session.config().max_scenarios)
}

async fn create_session(State(state): State<AppState>) -> Result<Response, WebError> {
    let id = state.store.create().await;
    let handle = lookup(&state, &id).await?;
    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(view(&id, &session))).into_response())
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, WebError> {
    let handle = lookup(&state, &id).await?;
    let session = handle.lock().await;
    Ok(Json(view(&id, &session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    if state.store.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WebError::SessionNotFound(id))
    }
}

async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<Json<TurnResponse>, WebError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;
    let reply = session
        .start(&request.career, &request.api_key, state.factory.as_ref())
        .await?;
    Ok(Json(TurnResponse {
        reply,
        session: view(&id, &session),
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, WebError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;
    let reply = session.send(&request.content).await?;
    Ok(Json(TurnResponse {
        reply,
        session: view(&id, &session),
    }))
}

async fn generate_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummaryRecord>, WebError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.summarize().await?))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, WebError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;
    session.reset();
    Ok(Json(view(&id, &session)))
}
