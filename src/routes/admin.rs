use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use futures::Stream;
use uuid::Uuid;

use crate::auth::{AdminGate, AdminInbox, GateError, GateState};
use crate::dto::admin_dto::{DeleteQuery, SessionRequest, SessionResponse, ToggleReadRequest};
use crate::error::Result;
use crate::models::message::Message;
use crate::services::inbox::InboxView;
use crate::AppState;

/// Runs the sign-in gate for one credential and reports where it landed.
pub async fn create_session(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SessionRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected session request");
            let mut body = SessionResponse::from(&GateState::Unauthenticated);
            body.error = Some(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let mut gate = AdminGate::new(state.identity_provider.clone(), state.access_policy.clone());
    match gate.sign_in(&req.id_token).await {
        Ok(landed) => (StatusCode::OK, Json(SessionResponse::from(landed))).into_response(),
        Err(GateError::Identity(e)) => {
            let mut body = SessionResponse::from(&GateState::Unauthenticated);
            body.error = Some(e.to_string());
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Unexpected gate transition");
            (StatusCode::CONFLICT, Json(serde_json::json!({ "error": e.to_string() })))
                .into_response()
        }
    }
}

pub async fn list_messages(Extension(inbox): Extension<AdminInbox>) -> Result<Json<InboxView>> {
    Ok(Json(inbox.list().await?))
}

/// Live inbox over Server-Sent Events. Each `snapshot` event is the complete
/// current view; the subscription ends when the client goes away.
pub async fn stream_messages(
    Extension(inbox): Extension<AdminInbox>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let subscription = inbox.subscribe();
    let stream = futures::stream::unfold(Some(subscription), |state| async move {
        let Some(mut subscription) = state else {
            return None;
        };
        match subscription.next_snapshot().await {
            Ok(Some(view)) => match Event::default().event("snapshot").json_data(&view) {
                Ok(event) => Some((Ok::<_, Infallible>(event), Some(subscription))),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode inbox snapshot");
                    Some((Ok::<_, Infallible>(error_event("encode_failed")), None))
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to read inbox snapshot");
                Some((Ok::<_, Infallible>(error_event("snapshot_failed")), None))
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn error_event(code: &str) -> Event {
    Event::default().event("error").data(code)
}

pub async fn toggle_read(
    Extension(inbox): Extension<AdminInbox>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleReadRequest>,
) -> Result<Json<Message>> {
    let updated = inbox.toggle_read(id, req.read).await?;
    Ok(Json(updated))
}

pub async fn delete_message(
    Extension(inbox): Extension<AdminInbox>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    inbox.delete(id, query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}
