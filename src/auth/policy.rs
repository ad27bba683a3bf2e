use std::sync::Arc;

use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::Result;
use crate::models::message::Message;
use crate::services::identity_service::Identity;
use crate::services::inbox::{InboxSubscription, InboxView};
use crate::services::message_service::MessageService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

/// Allow-list of operator identities. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: Arc<Vec<String>>,
}

impl AccessPolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Arc::new(allowed.into_iter().map(Into::into).collect()),
        }
    }

    pub fn evaluate(&self, identity: &Identity) -> Access {
        let candidate = identity.email.as_bytes();
        let matched = self
            .allowed
            .iter()
            .fold(false, |hit, allowed| hit | bool::from(allowed.as_bytes().ct_eq(candidate)));
        if matched {
            Access::Granted
        } else {
            Access::Denied
        }
    }

    /// The only way to obtain an [`AdminInbox`].
    pub fn authorize(&self, identity: &Identity, messages: &MessageService) -> Option<AdminInbox> {
        match self.evaluate(identity) {
            Access::Granted => Some(AdminInbox {
                operator: identity.clone(),
                messages: messages.clone(),
            }),
            Access::Denied => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Inbox operations on behalf of an authorized operator.
#[derive(Clone)]
pub struct AdminInbox {
    operator: Identity,
    messages: MessageService,
}

impl AdminInbox {
    pub fn operator(&self) -> &Identity {
        &self.operator
    }

    pub async fn list(&self) -> Result<InboxView> {
        self.messages.list().await
    }

    pub fn subscribe(&self) -> InboxSubscription {
        tracing::debug!(operator = %self.operator.email, "Opening live inbox");
        self.messages.subscribe()
    }

    pub async fn toggle_read(&self, id: Uuid, current: bool) -> Result<Message> {
        self.messages.toggle_read(id, current).await
    }

    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<()> {
        self.messages.delete(id, confirmed).await
    }
}
