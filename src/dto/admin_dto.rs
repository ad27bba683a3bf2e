use serde::{Deserialize, Serialize};

use crate::auth::gate::{GateAction, GateState};

#[derive(Debug, Clone, Deserialize)]
pub struct SessionRequest {
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub actions: &'static [GateAction],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&GateState> for SessionResponse {
    fn from(state: &GateState) -> Self {
        Self {
            state: state.name(),
            email: state.identity().map(|id| id.email.clone()),
            actions: state.actions(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleReadRequest {
    /// The read flag as the operator currently sees it.
    pub read: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}
