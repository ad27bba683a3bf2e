mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use mockall::mock;
use portfolio_inbox::{
    auth::AccessPolicy,
    database::{MessageStore, StoreChange},
    error::{Error, Result},
    models::message::{Message, NewMessage},
    routes::{self, RouteLimits},
    services::identity_service::JwtIdentityProvider,
    AppState,
};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

mock! {
    pub Store {}

    #[async_trait]
    impl MessageStore for Store {
        async fn insert(&self, new: NewMessage) -> Result<Message>;
        async fn list(&self) -> Result<Vec<Message>>;
        async fn set_read(&self, id: Uuid, read: bool) -> Result<Option<Message>>;
        async fn delete(&self, id: Uuid) -> Result<bool>;
        fn changes(&self) -> broadcast::Receiver<StoreChange>;
    }
}

fn app_with(store: MockStore) -> axum::Router {
    let state = AppState::new(
        Arc::new(store),
        Arc::new(JwtIdentityProvider::new(common::SECRET, None, None)),
        AccessPolicy::new([common::ADMIN]),
    );
    routes::router(state, RouteLimits::default())
}

#[tokio::test]
async fn store_error_on_intake_is_a_generic_failure() {
    let mut store = MockStore::new();
    store
        .expect_insert()
        .times(1)
        .returning(|_| Err(Error::Internal("connection refused".into())));
    let app = app_with(store);

    let body = json!({ "name": "Ada", "email": "ada@example.com", "message": "Hello" });
    let resp = common::send(&app, common::post_json("/api/contact", &body)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(resp).await;
    assert_eq!(body, json!({ "success": false, "message": "Transmission failed." }));
}

#[tokio::test]
async fn mutation_failures_are_surfaced() {
    let mut store = MockStore::new();
    store
        .expect_set_read()
        .returning(|_, _| Err(Error::Internal("write timed out".into())));
    store
        .expect_delete()
        .returning(|_| Err(Error::Internal("write timed out".into())));
    let app = app_with(store);
    let id = Uuid::new_v4();

    let resp = common::send(
        &app,
        common::admin_request(
            "POST",
            &format!("/api/admin/messages/{}/toggle-read", id),
            common::ADMIN,
            Some(json!({ "read": false })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::json_body(resp).await["error"], "write timed out");

    let resp = common::send(
        &app,
        common::admin_request(
            "DELETE",
            &format!("/api/admin/messages/{}?confirm=true", id),
            common::ADMIN,
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unconfirmed_delete_never_reaches_the_store() {
    let mut store = MockStore::new();
    store.expect_delete().never();
    let app = app_with(store);

    let resp = common::send(
        &app,
        common::admin_request(
            "DELETE",
            &format!("/api/admin/messages/{}", Uuid::new_v4()),
            common::ADMIN,
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
