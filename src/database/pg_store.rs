use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{MessageStore, StoreChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::Result;
use crate::models::message::{Message, NewMessage};

/// `pg_notify` channel fed by the trigger on `portfolio_messages`.
pub const NOTIFY_CHANNEL: &str = "portfolio_messages";

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
    changes: broadcast::Sender<StoreChange>,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    /// Forwards table notifications into the change channel. Every writer
    /// to the table is observed, not only this process. Each (re)connect
    /// publishes a resync so subscribers re-read past any gap.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let pool = self.pool.clone();
        let changes = self.changes.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = listen(&pool, &changes).await {
                    tracing::error!(error = ?e, "Message change listener error");
                }
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        })
    }
}

async fn listen(pool: &PgPool, changes: &broadcast::Sender<StoreChange>) -> Result<()> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(NOTIFY_CHANNEL).await?;
    tracing::info!("Listening for message changes on '{}'", NOTIFY_CHANNEL);
    // Writes made while no listener was attached were never notified.
    let _ = changes.send(StoreChange::resync());

    // `None` means the connection dropped; the caller reconnects.
    while let Some(notification) = listener.try_recv().await? {
        forward(notification.payload(), changes);
    }
    tracing::warn!("Message change listener lost its connection");
    Ok(())
}

fn forward(payload: &str, changes: &broadcast::Sender<StoreChange>) {
    match serde_json::from_str::<StoreChange>(payload) {
        Ok(change) => {
            let _ = changes.send(change);
        }
        Err(e) => tracing::warn!(
            error = %e,
            payload,
            "Ignoring malformed change notification"
        ),
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, new: NewMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO portfolio_messages (name, email, message)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, message, "timestamp", read
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn list(&self) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, name, email, message, "timestamp", read
            FROM portfolio_messages
            ORDER BY "timestamp" DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn set_read(&self, id: Uuid, read: bool) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            UPDATE portfolio_messages
            SET read = $2
            WHERE id = $1
            RETURNING id, name, email, message, "timestamp", read
            "#,
        )
        .bind(id)
        .bind(read)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM portfolio_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
