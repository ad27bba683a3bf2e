use std::sync::Arc;

use serde::Serialize;

use super::policy::{Access, AccessPolicy, AdminInbox};
use crate::services::identity_service::{Identity, IdentityError, IdentityProvider};
use crate::services::message_service::MessageService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    /// Waiting on the identity provider.
    Checking,
    Unauthorized(Identity),
    Authorized(Identity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    SignIn,
    SignOut,
    List,
    ToggleRead,
    Delete,
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Unauthenticated => "unauthenticated",
            GateState::Checking => "checking",
            GateState::Unauthorized(_) => "unauthorized",
            GateState::Authorized(_) => "authorized",
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            GateState::Unauthorized(id) | GateState::Authorized(id) => Some(id),
            _ => None,
        }
    }

    pub fn actions(&self) -> &'static [GateAction] {
        match self {
            GateState::Unauthenticated => &[GateAction::SignIn],
            GateState::Checking => &[],
            GateState::Unauthorized(_) => &[GateAction::SignOut],
            GateState::Authorized(_) => &[
                GateAction::List,
                GateAction::ToggleRead,
                GateAction::Delete,
                GateAction::SignOut,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("signed-in identity is not allowed to open the inbox")]
    NotAuthorized,
}

/// Sign-in state machine in front of the admin inbox.
///
/// `Unauthenticated -> Checking -> {Authorized, Unauthorized}`; sign-out from
/// any signed-in state returns to `Unauthenticated`. Provider failures are
/// reported and leave the gate `Unauthenticated` so the operator can retry.
pub struct AdminGate {
    provider: Arc<dyn IdentityProvider>,
    policy: AccessPolicy,
    state: GateState,
}

impl AdminGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, policy: AccessPolicy) -> Self {
        Self {
            provider,
            policy,
            state: GateState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub async fn sign_in(&mut self, credential: &str) -> Result<&GateState, GateError> {
        if self.state != GateState::Unauthenticated {
            return Err(GateError::InvalidTransition {
                action: "sign in",
                state: self.state.name(),
            });
        }

        self.state = GateState::Checking;
        match self.provider.verify(credential).await {
            Ok(identity) => {
                self.state = match self.policy.evaluate(&identity) {
                    Access::Granted => {
                        tracing::info!(operator = %identity.email, "Admin signed in");
                        GateState::Authorized(identity)
                    }
                    Access::Denied => {
                        tracing::warn!(identity = %identity.email, "Signed-in identity is not an admin");
                        GateState::Unauthorized(identity)
                    }
                };
                Ok(&self.state)
            }
            Err(e) => {
                self.state = GateState::Unauthenticated;
                match &e {
                    IdentityError::Cancelled => tracing::info!("Sign-in cancelled by user"),
                    other => tracing::warn!(error = %other, "Sign-in failed"),
                }
                Err(e.into())
            }
        }
    }

    /// Also recovers a gate left in `Checking` by an abandoned sign-in.
    pub fn sign_out(&mut self) -> &GateState {
        if let Some(identity) = self.state.identity() {
            tracing::info!(identity = %identity.email, "Signed out");
        }
        self.state = GateState::Unauthenticated;
        &self.state
    }

    pub fn inbox(&self, messages: &MessageService) -> Result<AdminInbox, GateError> {
        match &self.state {
            GateState::Authorized(identity) => self
                .policy
                .authorize(identity, messages)
                .ok_or(GateError::NotAuthorized),
            _ => Err(GateError::NotAuthorized),
        }
    }
}
