mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use careerday::client_wrapper::{ClientWrapper, SendError};
use careerday::session::SessionStore;
use careerday::web::{router, AppState};
use careerday::SimulationConfig;
use common::{Failure, ScriptedClient};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(client: Arc<ScriptedClient>) -> Router {
    let factory = move |_key: &str| -> Result<Arc<dyn ClientWrapper>, SendError> {
        Ok(client.clone())
    };
    let store = SessionStore::new(SimulationConfig::default().with_max_scenarios(1));
    router(AppState::new(store, Arc::new(factory)))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, view) = call(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["phase"], "NotStarted");
    view["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_index_serves_chat_page() {
    let app = app(Arc::new(ScriptedClient::new()));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Career Day Simulator"));
    assert!(html.contains("/api/sessions"));
    assert!(html.contains("sessionStorage"));
}

#[tokio::test]
async fn test_full_day_over_http() {
    careerday::init_logger();

    let client = Arc::new(ScriptedClient::new());
    let app = app(client.clone());
    let id = new_session(&app).await;
    let base = format!("/api/sessions/{}", id);

    let (status, res) = call(
        &app,
        Method::POST,
        &format!("{}/start", base),
        Some(json!({"career": "Chef", "api_key": "nvapi-test"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["reply"], "Narration 1");
    assert_eq!(res["session"]["phase"], "Active");
    assert_eq!(res["session"]["career"], "Chef");
    assert_eq!(res["session"]["time"], "9:00 AM");

    let (status, res) = call(
        &app,
        Method::POST,
        &format!("{}/messages", base),
        Some(json!({"content": "Taste the soup"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["reply"], "Narration 2");
    assert_eq!(res["session"]["phase"], "Complete");
    assert_eq!(res["session"]["scenarios_completed"], 1);
    assert_eq!(res["session"]["transcript"].as_array().unwrap().len(), 3);
    assert_eq!(res["session"]["transcript"][1]["role"], "user");

    let (status, summary) = call(&app, Method::POST, &format!("{}/summary", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["career"], "Chef");
    assert_eq!(summary["skills"], json!(["time management"]));
    assert_eq!(summary["agent_interactions"], 6);

    let (status, view) = call(&app, Method::GET, &base, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["summary"]["summary"], "Narration 3");
    assert_eq!(client.call_count(), 8);
}

#[tokio::test]
async fn test_input_errors_are_bad_requests() {
    let app = app(Arc::new(ScriptedClient::new()));
    let id = new_session(&app).await;

    let (status, err) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/start", id),
        Some(json!({"career": "Chef"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "An API key is required to start");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/start", id),
        Some(json!({"career": "", "api_key": "k"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    call(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/start", id),
        Some(json!({"career": "Chef", "api_key": "k"})),
    )
    .await;
    let (status, err) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Input must not be empty");
}

#[tokio::test]
async fn test_lifecycle_conflicts() {
    let app = app(Arc::new(ScriptedClient::new()));
    let id = new_session(&app).await;
    let base = format!("/api/sessions/{}", id);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("{}/messages", base),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let start = json!({"career": "Chef", "api_key": "k"});
    call(&app, Method::POST, &format!("{}/start", base), Some(start.clone())).await;
    let (status, _) = call(&app, Method::POST, &format!("{}/start", base), Some(start)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, Method::POST, &format!("{}/summary", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(
        &app,
        Method::POST,
        &format!("{}/messages", base),
        Some(json!({"content": "Taste the soup"})),
    )
    .await;
    let (status, err) = call(
        &app,
        Method::POST,
        &format!("{}/messages", base),
        Some(json!({"content": "And then?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "Career day complete");
}

#[tokio::test]
async fn test_model_failure_is_bad_gateway() {
    let client = Arc::new(ScriptedClient::new());
    client.fail_at(0, Failure::Request);
    let app = app(client);
    let id = new_session(&app).await;

    let (status, err) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/start", id),
        Some(json!({"career": "Chef", "api_key": "k"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(err["error"].as_str().unwrap().contains("HTTP 503"));
    let (_, view) = call(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(view["phase"], "NotStarted");
}

#[tokio::test]
async fn test_reset_and_delete() {
    let app = app(Arc::new(ScriptedClient::new()));
    let id = new_session(&app).await;
    let base = format!("/api/sessions/{}", id);
    call(
        &app,
        Method::POST,
        &format!("{}/start", base),
        Some(json!({"career": "Chef", "api_key": "k"})),
    )
    .await;

    let (status, view) = call(&app, Method::POST, &format!("{}/reset", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "NotStarted");
    assert_eq!(view["transcript"], json!([]));

    let (status, _) = call(&app, Method::DELETE, &base, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, err) = call(&app, Method::GET, &base, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], format!("Unknown session: {}", id));
    let (status, _) = call(&app, Method::DELETE, &base, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_session_is_not_found() {
    let store = SessionStore::default().with_idle_timeout(std::time::Duration::ZERO);
    let app = router(AppState::new(
        store,
        Arc::new(|_key: &str| -> Result<Arc<dyn ClientWrapper>, SendError> {
            Ok(Arc::new(ScriptedClient::new()))
        }),
    ));
    let stale = new_session(&app).await;

    new_session(&app).await;

    let (status, err) = call(&app, Method::GET, &format!("/api/sessions/{}", stale), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], format!("Unknown session: {}", stale));
}
