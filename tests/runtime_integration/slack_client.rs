use std::time::Duration;

use connect_manager::platform::{SlackApi, SlackApiError, SlackWebClient};

use super::support::{BOT_TOKEN, MockSlack};

fn client_for(slack: &MockSlack) -> SlackWebClient {
    SlackWebClient::new(&slack.base_url, BOT_TOKEN, Duration::from_secs(2))
        .expect("slack client should build")
}

#[tokio::test]
async fn channel_members_follows_cursor_pagination() {
    let slack = MockSlack::spawn()
        .await
        .with_channel("C1", &["U1", "U2", "U3", "U4", "U5"]);
    let client = client_for(&slack);

    let members = client.channel_members("C1").await.expect("members");
    assert_eq!(members, vec!["U1", "U2", "U3", "U4", "U5"]);
    assert_eq!(slack.member_pages_served(), 3);
}

#[tokio::test]
async fn user_profile_maps_display_name_and_bot_flag() {
    let slack = MockSlack::spawn()
        .await
        .with_user("U1", "ada", "Ada")
        .with_bot("B1", "deploybot");
    let client = client_for(&slack);

    let human = client.user_profile("U1").await.expect("profile");
    assert_eq!(human.resolved_name(), "Ada");
    assert!(!human.is_bot);

    let bot = client.user_profile("B1").await.expect("profile");
    assert!(bot.is_bot);
    assert_eq!(bot.resolved_name(), "deploybot");
}

#[tokio::test]
async fn slack_error_codes_and_http_failures_are_distinguished() {
    let slack = MockSlack::spawn().await;
    let client = client_for(&slack);

    assert_eq!(
        client.user_profile("UNOPE").await,
        Err(SlackApiError::Api("user_not_found".to_owned()))
    );
    assert_eq!(
        client.channel_members("CNOPE").await,
        Err(SlackApiError::Api("channel_not_found".to_owned()))
    );

    let wrong_base = SlackWebClient::new(
        slack.base_url.replace("/api", "/missing"),
        BOT_TOKEN,
        Duration::from_secs(2),
    )
    .expect("slack client should build");
    assert!(matches!(
        wrong_base.auth_test().await,
        Err(SlackApiError::Status { status: 404, .. })
    ));

    let bad_token = SlackWebClient::new(&slack.base_url, "xoxb-wrong", Duration::from_secs(2))
        .expect("slack client should build");
    assert_eq!(
        bad_token.auth_test().await,
        Err(SlackApiError::Api("invalid_auth".to_owned()))
    );
}

#[tokio::test]
async fn post_message_and_join_send_json_bodies() {
    let slack = MockSlack::spawn().await;
    let client = client_for(&slack);

    client.post_message("C1", "<@U1>").await.expect("post");
    client.join_channel("C2").await.expect("join");

    assert_eq!(slack.posted(), vec![("C1".to_owned(), "<@U1>".to_owned())]);
    assert_eq!(slack.joined(), vec!["C2".to_owned()]);
}

#[tokio::test]
async fn channel_members_stops_at_the_page_cap() {
    let members = (0..250).map(|index| format!("U{index:03}")).collect::<Vec<_>>();
    let member_refs = members.iter().map(String::as_str).collect::<Vec<_>>();
    let slack = MockSlack::spawn().await.with_channel("CBIG", &member_refs);
    let client = client_for(&slack);

    let fetched = client.channel_members("CBIG").await.expect("members");
    assert_eq!(slack.member_pages_served(), 100);
    assert_eq!(fetched.len(), 200);
    assert_eq!(fetched.first().map(String::as_str), Some("U000"));
    assert_eq!(fetched.last().map(String::as_str), Some("U199"));
}
