use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::database::{ChangeKind, MessageStore, StoreChange};
use crate::error::Result;
use crate::models::message::Message;

/// What the admin sees: all messages newest first plus the unread badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxView {
    pub unread_count: usize,
    pub messages: Vec<Message>,
}

impl InboxView {
    pub fn new(messages: Vec<Message>) -> Self {
        let unread_count = messages.iter().filter(|m| !m.read).count();
        Self {
            unread_count,
            messages,
        }
    }
}

/// A live inbox. The first call to [`next_snapshot`](Self::next_snapshot)
/// yields the current view; each later call waits for a store change and
/// re-reads the whole view. Dropping the subscription releases it.
pub struct InboxSubscription {
    store: Arc<dyn MessageStore>,
    changes: broadcast::Receiver<StoreChange>,
    primed: bool,
}

impl InboxSubscription {
    pub(crate) fn new(store: Arc<dyn MessageStore>) -> Self {
        // Subscribe before the first read so nothing slips between them.
        let changes = store.changes();
        tracing::debug!("Inbox subscription opened");
        Self {
            store,
            changes,
            primed: false,
        }
    }

    /// `Ok(None)` once the store stops publishing changes.
    pub async fn next_snapshot(&mut self) -> Result<Option<InboxView>> {
        if self.primed {
            match self.changes.recv().await {
                Ok(change) if change.kind == ChangeKind::Resync => {
                    tracing::info!("Store asked for a resync, re-reading snapshot")
                }
                Ok(change) => tracing::debug!(?change, "Inbox change received"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Inbox subscription lagged, re-reading snapshot")
                }
                Err(RecvError::Closed) => return Ok(None),
            }
            // Collapse a burst of changes into one snapshot.
            while let Ok(change) = self.changes.try_recv() {
                tracing::debug!(?change, "Inbox change received");
            }
        }
        self.primed = true;
        let messages = self.store.list().await?;
        Ok(Some(InboxView::new(messages)))
    }
}

impl Drop for InboxSubscription {
    fn drop(&mut self) {
        tracing::debug!("Inbox subscription released");
    }
}
