use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::Service;

use server::routes;
use server::ServerState;

fn build_app() -> Router {
    routes::build_router(ServerState::in_memory("test-secret"), tower_http::cors::CorsLayer::very_permissive())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().call(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Registers and logs in `email`, returning the bearer token.
async fn login(app: &Router, email: &str) -> String {
    let register = json!({"name": "Tester", "email": email, "password": "p"});
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(register.to_string()))
        .unwrap();
    assert_eq!(send(app, req).await.0, StatusCode::OK);

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": email, "password": "p"}).to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    body["session"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_task_routes_require_a_session() {
    let app = build_app();
    let req = Request::builder().uri("/api/tasks").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app, request("GET", "/api/tasks", "not-a-jwt", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_buy_milk_scenario() {
    let app = build_app();
    let token = login(&app, "a@x.com").await;

    let (status, created) = send(&app, request("POST", "/api/tasks", &token, Some(json!({"description": "Buy milk"})))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["title"], Value::Null);
    assert_eq!(created["status"], "Pending");
    assert_eq!(created["revision"], 1);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["description"], "Buy milk");

    let update = json!({"description": "Buy milk", "status": "Approved"});
    let (status, updated) = send(&app, request("PUT", &format!("/api/tasks/{id}"), &token, Some(update))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Approved");
    assert_eq!(updated["revision"], 2);

    let (_, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["status"], "Approved");

    let (status, _) = send(&app, request("DELETE", &format!("/api/tasks/{id}"), &token, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let app = build_app();
    let token = login(&app, "a@x.com").await;

    let (status, body) = send(&app, request("POST", "/api/tasks", &token, Some(json!({"title": "t"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation");

    let (status, _) = send(&app, request("POST", "/api/tasks", &token, Some(json!({"description": "d", "status": "Done"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(&app, request("PUT", &format!("/api/tasks/{missing}"), &token, Some(json!({"description": "d"})))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    let (status, _) = send(&app, request("DELETE", &format!("/api/tasks/{missing}"), &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_stale_revision_conflicts() {
    let app = build_app();
    let token = login(&app, "a@x.com").await;
    let (_, created) = send(&app, request("POST", "/api/tasks", &token, Some(json!({"description": "v1"})))).await;
    let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, request("PUT", &uri, &token, Some(json!({"description": "v2", "expected_revision": 1})))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, request("PUT", &uri, &token, Some(json!({"description": "v3", "expected_revision": 1})))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (_, task) = send(&app, request("GET", &uri, &token, None)).await;
    assert_eq!(task["description"], "v2");
}

#[tokio::test]
async fn test_tasks_are_private_to_their_owner() {
    let app = build_app();
    let alice = login(&app, "alice@x.com").await;
    let bob = login(&app, "bob@x.com").await;

    let (_, created) = send(&app, request("POST", "/api/tasks", &alice, Some(json!({"description": "secret"})))).await;
    let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

    let (_, list) = send(&app, request("GET", "/api/tasks", &bob, None)).await;
    assert_eq!(list, json!([]));
    assert_eq!(send(&app, request("GET", &uri, &bob, None)).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, request("PUT", &uri, &bob, Some(json!({"description": "mine"})))).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, request("DELETE", &uri, &bob, None)).await.0, StatusCode::NOT_FOUND);

    let (_, task) = send(&app, request("GET", &uri, &alice, None)).await;
    assert_eq!(task["description"], "secret");
}

fn raw_request(method: &str, uri: &str, token: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = build_app();
    let token = login(&app, "shape@x.com").await;

    let (status, body) = send(&app, request("PUT", "/api/tasks/not-a-uuid", &token, Some(json!({"description": "d"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation");
    assert!(body["message"].is_string());

    let (status, body) = send(&app, request("GET", "/api/tasks/not-a-uuid", &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation");

    for wrong_type in [json!({"description": 5}), json!({"description": "d", "status": 1})] {
        let (status, body) = send(&app, request("POST", "/api/tasks", &token, Some(wrong_type))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation");
    }

    let (status, body) = send(&app, raw_request("POST", "/api/tasks", &token, Some("application/json"), "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation");

    let (status, body) = send(&app, raw_request("POST", "/api/tasks", &token, None, r#"{"description":"d"}"#)).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "UnsupportedMediaType");

    let (_, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_malformed_login_body_is_json_validation_error() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email": 7}"#))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation");
}
