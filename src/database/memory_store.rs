use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{ChangeKind, MessageStore, StoreChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::{Error, Result};
use crate::models::message::{Message, NewMessage};
use crate::utils::time;

#[derive(Debug, Default)]
struct Rows {
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
    by_id: HashMap<Uuid, (u64, Message)>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Debug)]
pub struct MemoryMessageStore {
    rows: Mutex<Rows>,
    changes: broadcast::Sender<StoreChange>,
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            rows: Mutex::new(Rows::default()),
            changes,
        }
    }

    /// Number of live change receivers, i.e. open inbox subscriptions.
    pub fn receiver_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn rows(&self) -> Result<MutexGuard<'_, Rows>> {
        self.rows
            .lock()
            .map_err(|_| Error::Internal("message store lock poisoned".to_string()))
    }

    fn publish(&self, kind: ChangeKind, id: Uuid) {
        // No receivers just means no inbox is open.
        let _ = self.changes.send(StoreChange::row(kind, id));
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, new: NewMessage) -> Result<Message> {
        let message = {
            let mut rows = self.rows()?;
            // Stamped under the lock and never behind the previous row, so
            // timestamp order agrees with insertion order.
            let now = time::now();
            let timestamp = match rows.last_timestamp {
                Some(last) if last > now => last,
                _ => now,
            };
            let message = Message {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                message: new.message,
                timestamp,
                read: false,
            };
            rows.next_seq += 1;
            rows.last_timestamp = Some(timestamp);
            let seq = rows.next_seq;
            rows.by_id.insert(message.id, (seq, message.clone()));
            message
        };
        self.publish(ChangeKind::Inserted, message.id);
        Ok(message)
    }

    async fn list(&self) -> Result<Vec<Message>> {
        let rows = self.rows()?;
        let mut entries: Vec<&(u64, Message)> = rows.by_id.values().collect();
        entries.sort_by(|(a_seq, a), (b_seq, b)| {
            b.timestamp.cmp(&a.timestamp).then(b_seq.cmp(a_seq))
        });
        Ok(entries.into_iter().map(|(_, m)| m.clone()).collect())
    }

    async fn set_read(&self, id: Uuid, read: bool) -> Result<Option<Message>> {
        let updated = {
            let mut rows = self.rows()?;
            rows.by_id.get_mut(&id).map(|(_, m)| {
                m.read = read;
                m.clone()
            })
        };
        if updated.is_some() {
            self.publish(ChangeKind::Updated, id);
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = self.rows()?.by_id.remove(&id).is_some();
        if removed {
            self.publish(ChangeKind::Deleted, id);
        }
        Ok(removed)
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(name: &str) -> NewMessage {
        NewMessage {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            message: "Hello there".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_timestamp_and_unread() {
        let store = MemoryMessageStore::new();
        let before = time::now();
        let msg = store.insert(new_message("Ada")).await.unwrap();
        assert!(!msg.read);
        assert!(msg.timestamp >= before);
        assert_eq!(store.list().await.unwrap(), vec![msg]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryMessageStore::new();
        let first = store.insert(new_message("First")).await.unwrap();
        let second = store.insert(new_message("Second")).await.unwrap();
        let third = store.insert(new_message("Third")).await.unwrap();

        let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_later_insert_first() {
        let store = MemoryMessageStore::new();
        let earlier = store.insert(new_message("Earlier")).await.unwrap();
        let later = store.insert(new_message("Later")).await.unwrap();
        let shared = earlier.timestamp;
        {
            let mut rows = store.rows().unwrap();
            for (_, m) in rows.by_id.values_mut() {
                m.timestamp = shared;
            }
        }

        for _ in 0..10 {
            let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![later.id, earlier.id]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_keep_timestamps_in_insertion_order() {
        let store = std::sync::Arc::new(MemoryMessageStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(new_message(&format!("N{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.rows().unwrap();
        let mut by_seq: Vec<&(u64, Message)> = rows.by_id.values().collect();
        by_seq.sort_by_key(|(seq, _)| *seq);
        assert!(by_seq
            .windows(2)
            .all(|pair| pair[0].1.timestamp <= pair[1].1.timestamp));
    }

    #[tokio::test]
    async fn set_read_and_delete_publish_changes() {
        let store = MemoryMessageStore::new();
        let msg = store.insert(new_message("Ada")).await.unwrap();
        let mut changes = store.changes();

        let updated = store.set_read(msg.id, true).await.unwrap().unwrap();
        assert!(updated.read);
        assert_eq!(updated.timestamp, msg.timestamp);
        assert!(store.delete(msg.id).await.unwrap());
        assert!(!store.delete(msg.id).await.unwrap());

        assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Updated);
        assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Deleted);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn set_read_on_unknown_id_is_none() {
        let store = MemoryMessageStore::new();
        assert_eq!(store.set_read(Uuid::new_v4(), true).await.unwrap(), None);
    }
}
