use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{SlackApi, SlackApiError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("no members to mention")]
    NoRecipients,
    #[error("{0}")]
    NotificationFailed(SlackApiError),
}

#[must_use]
pub fn mention(member_id: &str) -> String {
    format!("<@{member_id}>")
}

/// Posts a single message to `channel_id` that mentions every member, space separated.
/// Blank ids are skipped; nothing is sent when no mentions remain. Failures are not retried.
pub async fn ping_members<'a>(
    slack: &dyn SlackApi,
    channel_id: &str,
    member_ids: impl IntoIterator<Item = &'a str>,
) -> Result<usize, NotifyError> {
    let mentions = member_ids
        .into_iter()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(mention)
        .collect::<Vec<_>>();

    if mentions.is_empty() {
        return Err(NotifyError::NoRecipients);
    }

    let text = mentions.join(" ");
    if let Err(error) = slack.post_message(channel_id, &text).await {
        warn!("ping to channel {channel_id} failed: {error}");
        return Err(NotifyError::NotificationFailed(error));
    }

    info!("pinged {} members in channel {channel_id}", mentions.len());
    Ok(mentions.len())
}
