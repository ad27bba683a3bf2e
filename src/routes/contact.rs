use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dto::contact_dto::{ContactRequest, ContactResponse};
use crate::utils::validation::validate;
use crate::AppState;

/// Every failure gets the same body; details only go to the log.
fn failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ContactResponse::failed()),
    )
        .into_response()
}

pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected contact submission");
            return failure();
        }
    };

    if let Err(e) = validate(&req) {
        tracing::warn!(error = %e, "Contact submission failed validation");
        return failure();
    }

    tracing::info!(sender = %req.email, name = %req.name, "Contact form submission received");

    match state.message_service.submit(req.into()).await {
        Ok(_) => (StatusCode::OK, Json(ContactResponse::received())).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "Contact form error");
            failure()
        }
    }
}
