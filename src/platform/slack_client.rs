use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{BotIdentity, SlackApi, SlackApiError, UserProfile};

const MEMBERS_PAGE_LIMIT: u32 = 200;
const MAX_MEMBER_PAGES: usize = 100;

/// Slack Web API client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct SlackWebClient {
    http: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersInfoResponse {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    profile: SlackUserProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackUserProfile {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ConversationMembersResponse {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

impl SlackWebClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                SlackApiError::Transport(format!("failed to construct http client: {error}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    fn get(&self, method: &str) -> RequestBuilder {
        self.http.get(self.endpoint(method)).bearer_auth(&self.token)
    }

    fn post(&self, method: &str) -> RequestBuilder {
        self.http.post(self.endpoint(method)).bearer_auth(&self.token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<T, SlackApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(format!("{method}: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| SlackApiError::Decode(format!("{method}: {error}")))?;

        if !payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(SlackApiError::Api(code.to_owned()));
        }

        serde_json::from_value::<T>(payload)
            .map_err(|error| SlackApiError::Decode(format!("{method}: {error}")))
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn auth_test(&self) -> Result<BotIdentity, SlackApiError> {
        let response: AuthTestResponse = self.call("auth.test", self.post("auth.test")).await?;
        Ok(BotIdentity {
            user_id: response.user_id,
            team: response.team,
            bot_id: response.bot_id,
        })
    }

    async fn user_profile(&self, member_id: &str) -> Result<UserProfile, SlackApiError> {
        let request = self.get("users.info").query(&[("user", member_id)]);
        let response: UsersInfoResponse = self.call("users.info", request).await?;
        Ok(UserProfile {
            id: response.user.id,
            name: response.user.name,
            display_name: response.user.profile.display_name,
            is_bot: response.user.is_bot,
        })
    }

    async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, SlackApiError> {
        let mut members = Vec::new();
        let mut cursor = String::new();
        let limit = MEMBERS_PAGE_LIMIT.to_string();

        for _ in 0..MAX_MEMBER_PAGES {
            let mut query = vec![("channel", channel_id), ("limit", limit.as_str())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let request = self.get("conversations.members").query(&query);
            let page: ConversationMembersResponse =
                self.call("conversations.members", request).await?;
            members.extend(page.members);

            cursor = page
                .response_metadata
                .map(|metadata| metadata.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(members);
            }
            debug!(
                "conversations.members channel={channel_id} fetched={} continuing",
                members.len()
            );
        }

        warn!(
            "conversations.members channel={channel_id} stopped after {MAX_MEMBER_PAGES} pages, returning {} members",
            members.len()
        );
        Ok(members)
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
        let request = self.post("chat.postMessage").json(&json!({
            "channel": channel_id,
            "text": text,
        }));
        let _: Value = self.call("chat.postMessage", request).await?;
        Ok(())
    }

    async fn join_channel(&self, channel_id: &str) -> Result<(), SlackApiError> {
        let request = self.post("conversations.join").json(&json!({
            "channel": channel_id,
        }));
        let _: Value = self.call("conversations.join", request).await?;
        Ok(())
    }
}
