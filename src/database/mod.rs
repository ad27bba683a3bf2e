pub mod memory_store;
pub mod pg_store;
pub mod pool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::models::message::{Message, NewMessage};

pub use memory_store::MemoryMessageStore;
pub use pg_store::PgMessageStore;

/// Capacity of the change channel. Receivers that fall further behind get a
/// `Lagged` error and re-read the whole snapshot.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "INSERT")]
    Inserted,
    #[serde(rename = "UPDATE")]
    Updated,
    #[serde(rename = "DELETE")]
    Deleted,
    /// Changes may have been missed; subscribers re-read everything.
    #[serde(rename = "RESYNC")]
    Resync,
}

/// One row-level change, shaped like the payload of the table trigger.
/// `id` is absent only for [`ChangeKind::Resync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    #[serde(rename = "op")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub id: Option<Uuid>,
}

impl StoreChange {
    pub fn row(kind: ChangeKind, id: Uuid) -> Self {
        Self { kind, id: Some(id) }
    }

    pub fn resync() -> Self {
        Self {
            kind: ChangeKind::Resync,
            id: None,
        }
    }
}

/// The document store behind the inbox.
///
/// Implementations assign identifiers and creation timestamps, return
/// `list` newest first, and publish a [`StoreChange`] for every mutation,
/// including ones made by writers outside this process where the backend
/// can observe them. A backend that may have dropped notifications
/// publishes [`StoreChange::resync`] instead.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, new: NewMessage) -> Result<Message>;

    async fn list(&self) -> Result<Vec<Message>>;

    /// Single-field write of the read flag. `None` when the id is unknown.
    async fn set_read(&self, id: Uuid, read: bool) -> Result<Option<Message>>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    fn changes(&self) -> broadcast::Receiver<StoreChange>;
}
