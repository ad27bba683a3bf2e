use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The contact form posts JSON from the site's origin; the admin client also
/// sends a bearer token.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(Any)
}
