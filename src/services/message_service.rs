use std::sync::Arc;

use uuid::Uuid;

use crate::database::MessageStore;
use crate::error::{Error, Result};
use crate::models::message::{Message, NewMessage};
use crate::services::inbox::{InboxSubscription, InboxView};

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Appends one submission. The store stamps id, timestamp and `read = false`.
    pub async fn submit(&self, new: NewMessage) -> Result<Message> {
        let message = self.store.insert(new).await?;
        tracing::info!(
            message_id = %message.id,
            sender = %message.email,
            "Contact form submission stored"
        );
        Ok(message)
    }

    pub async fn list(&self) -> Result<InboxView> {
        Ok(InboxView::new(self.store.list().await?))
    }

    /// Writes the negation of `current`. This is a blind single-field write,
    /// so a stale `current` simply flips the flag again.
    pub async fn toggle_read(&self, id: Uuid, current: bool) -> Result<Message> {
        match self.store.set_read(id, !current).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(Error::NotFound(format!("Message {} not found", id))),
            Err(e) => {
                tracing::error!(error = ?e, message_id = %id, "Failed to update message");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(Error::ConfirmationRequired("deleting a message".to_string()));
        }
        match self.store.delete(id).await {
            Ok(true) => {
                tracing::info!(message_id = %id, "Message deleted");
                Ok(())
            }
            Ok(false) => Err(Error::NotFound(format!("Message {} not found", id))),
            Err(e) => {
                tracing::error!(error = ?e, message_id = %id, "Failed to delete message");
                Err(e)
            }
        }
    }

    pub fn subscribe(&self) -> InboxSubscription {
        InboxSubscription::new(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryMessageStore;

    fn service() -> MessageService {
        MessageService::new(Arc::new(MemoryMessageStore::new()))
    }

    fn ada() -> NewMessage {
        NewMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "Hello".into(),
        }
    }

    #[tokio::test]
    async fn toggle_twice_restores_read_flag() {
        let svc = service();
        let msg = svc.submit(ada()).await.unwrap();

        let once = svc.toggle_read(msg.id, msg.read).await.unwrap();
        assert!(once.read);
        let twice = svc.toggle_read(once.id, once.read).await.unwrap();
        assert_eq!(twice.read, msg.read);
    }

    #[tokio::test]
    async fn stale_toggle_flips_from_given_value() {
        let svc = service();
        let msg = svc.submit(ada()).await.unwrap();
        svc.toggle_read(msg.id, false).await.unwrap();
        // caller still believes it is unread: writes true again
        let again = svc.toggle_read(msg.id, false).await.unwrap();
        assert!(again.read);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let svc = service();
        let msg = svc.submit(ada()).await.unwrap();

        let err = tokio_test::assert_err!(svc.delete(msg.id, false).await);
        assert!(matches!(err, Error::ConfirmationRequired(_)));
        assert_eq!(svc.list().await.unwrap().messages.len(), 1);

        tokio_test::assert_ok!(svc.delete(msg.id, true).await);
        assert!(svc.list().await.unwrap().messages.is_empty());
        assert!(matches!(
            svc.delete(msg.id, true).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn toggle_unknown_is_not_found() {
        let err = service().toggle_read(Uuid::new_v4(), false).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
