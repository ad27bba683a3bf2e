pub mod admin;
pub mod contact;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::require_admin,
    cors::permissive_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Contact bodies are a few kilobytes at most.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct RouteLimits {
    pub contact_rps: u32,
    pub admin_rps: u32,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            contact_rps: 5,
            admin_rps: 50,
        }
    }
}

pub fn router(state: AppState, limits: RouteLimits) -> Router {
    let public_api = Router::new()
        .route("/api/contact", post(contact::submit_contact))
        .layer(from_fn_with_state(
            RateLimiter::per_second(limits.contact_rps),
            rps_middleware,
        ));

    let inbox_api = Router::new()
        .route("/api/admin/messages", get(admin::list_messages))
        .route("/api/admin/messages/stream", get(admin::stream_messages))
        .route(
            "/api/admin/messages/:id/toggle-read",
            post(admin::toggle_read),
        )
        .route("/api/admin/messages/:id", delete(admin::delete_message))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let admin_api = Router::new()
        .route("/api/admin/session", post(admin::create_session))
        .merge(inbox_api)
        .layer(from_fn_with_state(
            RateLimiter::per_second(limits.admin_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(admin_api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
}
