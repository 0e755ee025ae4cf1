//! The slice of the Slack platform this service depends on.
//!
//! Command handling and reconciliation only see the [`SlackApi`] capability; the production
//! implementation is [`SlackWebClient`], tests substitute their own.

mod slack_client;

use async_trait::async_trait;
use thiserror::Error;

pub use slack_client::SlackWebClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub team: Option<String>,
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub is_bot: bool,
}

impl UserProfile {
    /// The profile display name, or the account name when the display name is blank.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Slack answered `ok: false`; carries the Slack error code (e.g. `channel_not_found`).
    #[error("{0}")]
    Api(String),
    #[error("slack response decode failed: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn auth_test(&self) -> Result<BotIdentity, SlackApiError>;

    async fn user_profile(&self, member_id: &str) -> Result<UserProfile, SlackApiError>;

    async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, SlackApiError>;

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError>;

    async fn join_channel(&self, channel_id: &str) -> Result<(), SlackApiError>;
}
