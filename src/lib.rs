pub mod auth;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::auth::AccessPolicy;
use crate::config::Config;
use crate::database::{MemoryMessageStore, MessageStore, PgMessageStore};
use crate::services::{
    identity_service::{provider_from_config, IdentityProvider},
    message_service::MessageService,
};

#[derive(Clone)]
pub struct AppState {
    pub message_service: MessageService,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub access_policy: AccessPolicy,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MessageStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        access_policy: AccessPolicy,
    ) -> Self {
        Self {
            message_service: MessageService::new(store),
            identity_provider,
            access_policy,
        }
    }

    /// Wires the configured store and identity provider. With a database the
    /// schema is migrated and the change listener started.
    pub async fn from_config(config: &Config) -> error::Result<Self> {
        let store: Arc<dyn MessageStore> = match &config.database_url {
            Some(url) => {
                let pool = database::pool::create_pool(url).await?;
                database::pool::run_migrations(&pool).await?;
                let store = PgMessageStore::new(pool);
                store.spawn_listener();
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; messages are kept in memory only");
                Arc::new(MemoryMessageStore::new())
            }
        };

        if config.admin_emails.is_empty() {
            tracing::warn!("ADMIN_EMAILS is empty; nobody can open the inbox");
        }

        Ok(Self::new(
            store,
            provider_from_config(config)?,
            AccessPolicy::new(config.admin_emails.iter().cloned()),
        ))
    }
}
