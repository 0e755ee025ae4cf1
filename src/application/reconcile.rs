use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{application::state::SharedState, domain::error::DomainError};

/// What a single-channel refresh observed and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub channel_id: String,
    pub members_seen: usize,
    pub users_updated: usize,
    pub skipped_bots: usize,
    pub failed_profiles: usize,
    pub team_members_updated: usize,
}

/// Refreshes every tracked channel once. A failing channel is logged and skipped.
pub async fn refresh_all(state: &SharedState) -> Vec<RefreshSummary> {
    let channels = match state.store().load_channels().await {
        Ok(channels) => channels,
        Err(error) => {
            error!("user refresh skipped, channels unreadable: {error}");
            return Vec::new();
        }
    };

    let mut summaries = Vec::with_capacity(channels.len());
    for channel_id in channels.ids() {
        match refresh_channel(state, channel_id).await {
            Ok(summary) => summaries.push(summary),
            Err(error) => warn!("user refresh for channel {channel_id} failed: {error}"),
        }
    }

    info!("user refresh completed channels={}", summaries.len());
    summaries
}

/// Pulls the current members of `channel_id` from Slack and merges their profiles into the users
/// registry and into every team that lists them.
///
/// Users and teams are loaded before the Slack calls and saved once at the end, each on its own.
/// A member whose profile cannot be fetched is skipped, bots are ignored, and a failed save of one
/// collection does not undo the other.
pub async fn refresh_channel(
    state: &SharedState,
    channel_id: &str,
) -> Result<RefreshSummary, DomainError> {
    debug!("refreshing users for channel {channel_id}");

    let mut users = state.store().load_users().await?;
    let mut teams = state.store().load_teams().await?;
    let member_ids = state.slack().channel_members(channel_id).await?;

    let mut summary = RefreshSummary {
        channel_id: channel_id.to_owned(),
        members_seen: member_ids.len(),
        ..RefreshSummary::default()
    };

    for member_id in &member_ids {
        let profile = match state.slack().user_profile(member_id).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!("profile lookup for {member_id} failed: {error}");
                summary.failed_profiles += 1;
                continue;
            }
        };

        if profile.is_bot {
            debug!("skipping bot user {member_id}");
            summary.skipped_bots += 1;
            continue;
        }

        let name = profile.resolved_name();
        users.record_observation(member_id, name, channel_id, Utc::now());
        summary.users_updated += 1;
        summary.team_members_updated += teams.apply_observation(member_id, name, channel_id);
    }

    if let Err(error) = state.store().save_users(&users).await {
        error!("failed to save users after refreshing channel {channel_id}: {error}");
    }
    if let Err(error) = state.store().save_teams(&teams).await {
        error!("failed to save teams after refreshing channel {channel_id}: {error}");
    }

    info!(
        "refreshed channel {channel_id} members={} users={} bots={} failed={} team_members={}",
        summary.members_seen,
        summary.users_updated,
        summary.skipped_bots,
        summary.failed_profiles,
        summary.team_members_updated
    );
    Ok(summary)
}

/// Detached one-shot refresh for a channel that was just added. Nothing awaits the handle in
/// production; the outcome is only visible in the logs.
pub fn spawn_channel_refresh(state: SharedState, channel_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = refresh_channel(&state, &channel_id).await {
            warn!("initial user refresh for channel {channel_id} failed: {error}");
        }
    })
}

/// Periodic full refresh. Returns `None` when disabled by config.
pub fn spawn_refresh_loop(state: SharedState) -> Option<JoinHandle<()>> {
    if !state.config().refresh_enabled {
        info!("user refresh loop disabled by runtime config");
        return None;
    }

    let interval = state.config().refresh_interval;
    info!("starting user refresh loop every {}ms", interval.as_millis());
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let _summaries = refresh_all(&state).await;
        }
    }))
}
