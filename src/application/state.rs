use std::{sync::Arc, time::Instant};

use serde_json::{Value, json};

use crate::{
    application::config::RuntimeConfig,
    domain::error::DomainError,
    platform::{BotIdentity, SlackApi},
    storage::JsonStore,
};

/// Service object handed to the HTTP handlers and the background refresh tasks.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<InnerState>,
}

struct InnerState {
    config: RuntimeConfig,
    store: JsonStore,
    slack: Arc<dyn SlackApi>,
    bot: BotIdentity,
    started_at: Instant,
}

impl SharedState {
    /// Opens the data directory, seeds missing collection files and authenticates the bot token.
    /// Any failure here is fatal for startup.
    pub async fn new(config: RuntimeConfig, slack: Arc<dyn SlackApi>) -> Result<Self, DomainError> {
        let store = JsonStore::open(&config.data_dir).await?;
        store.ensure_initialized().await?;

        let bot = slack.auth_test().await.map_err(|error| {
            DomainError::Unavailable(format!("slack authentication failed: {error}"))
        })?;

        Ok(Self {
            inner: Arc::new(InnerState {
                config,
                store,
                slack,
                bot,
                started_at: Instant::now(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &JsonStore {
        &self.inner.store
    }

    #[must_use]
    pub fn slack(&self) -> &dyn SlackApi {
        self.inner.slack.as_ref()
    }

    #[must_use]
    pub fn bot(&self) -> &BotIdentity {
        &self.inner.bot
    }

    #[must_use]
    pub fn uptime_ms(&self) -> u64 {
        u64::try_from(self.inner.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub async fn health_payload(&self) -> Result<Value, DomainError> {
        let teams = self.store().load_teams().await?;
        let users = self.store().load_users().await?;
        let channels = self.store().load_channels().await?;

        Ok(json!({
            "ok": true,
            "version": env!("CARGO_PKG_VERSION"),
            "botUserId": self.bot().user_id,
            "uptimeMs": self.uptime_ms(),
            "teams": teams.names().count(),
            "users": users.len(),
            "channels": channels.len(),
        }))
    }
}
