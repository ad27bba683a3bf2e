#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use portfolio_inbox::{
    auth::AccessPolicy,
    database::{MemoryMessageStore, MessageStore},
    routes::{self, RouteLimits},
    services::identity_service::JwtIdentityProvider,
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

pub const SECRET: &str = "test_identity_secret";
pub const ADMIN: &str = "admin@example.com";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryMessageStore>,
    pub state: AppState,
}

pub fn setup_app() -> TestApp {
    setup_app_with_store(Arc::new(MemoryMessageStore::new()))
}

pub fn setup_app_with_store(store: Arc<MemoryMessageStore>) -> TestApp {
    let state = AppState::new(
        store.clone() as Arc<dyn MessageStore>,
        Arc::new(JwtIdentityProvider::new(SECRET, None, None)),
        AccessPolicy::new([ADMIN]),
    );
    let app = routes::router(
        state.clone(),
        RouteLimits {
            contact_rps: 1000,
            admin_rps: 1000,
        },
    );
    TestApp { app, store, state }
}

pub fn id_token(email: &str) -> String {
    let claims = json!({
        "sub": format!("sub-{}", email),
        "email": email,
        "email_verified": true,
        "exp": chrono::Utc::now().timestamp() + 600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn post_json(uri: &str, body: &JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, email: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", id_token(email)));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(resp: Response<Body>) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn submit(app: &Router, name: &str, email: &str, message: &str) -> StatusCode {
    let body = json!({ "name": name, "email": email, "message": message });
    send(app, post_json("/api/contact", &body)).await.status()
}

pub async fn list(app: &Router) -> JsonValue {
    let resp = send(app, admin_request("GET", "/api/admin/messages", ADMIN, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await
}
