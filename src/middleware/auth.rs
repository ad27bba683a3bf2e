use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::AppState;

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, Response> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"))
}

/// Verifies the operator's ID token and admits only allow-listed identities.
/// Downstream handlers receive the resulting `AdminInbox` as an extension.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let identity = {
        // Owned so no borrow of the request is held across the await.
        let token = match bearer_token(req.headers()) {
            Ok(token) => token.to_owned(),
            Err(resp) => return resp,
        };
        match state.identity_provider.verify(&token).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Admin credential rejected");
                return reject(StatusCode::UNAUTHORIZED, "invalid_token");
            }
        }
    };

    match state
        .access_policy
        .authorize(&identity, &state.message_service)
    {
        Some(inbox) => {
            req.extensions_mut().insert(inbox);
            next.run(req).await
        }
        None => {
            tracing::warn!(identity = %identity.email, "Inbox access denied");
            reject(StatusCode::FORBIDDEN, "forbidden")
        }
    }
}
