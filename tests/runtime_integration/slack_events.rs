use super::support::{MockSlack, spawn_server};

#[tokio::test]
async fn url_verification_echoes_challenge_as_plain_text() {
    let server = spawn_server(MockSlack::spawn().await).await;

    let response = reqwest::Client::new()
        .post(server.url("/slack/events"))
        .header("content-type", "application/json")
        .body(r#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","token":"t"}"#)
        .send()
        .await
        .expect("events request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        response.text().await.expect("body"),
        "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
    );

    server.stop().await;
}

#[tokio::test]
async fn other_events_are_acknowledged_with_empty_body() {
    let server = spawn_server(MockSlack::spawn().await).await;

    let response = reqwest::Client::new()
        .post(server.url("/slack/events"))
        .header("content-type", "application/json")
        .body(r#"{"type":"event_callback","event":{"type":"member_joined_channel"}}"#)
        .send()
        .await
        .expect("events request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.expect("body").is_empty());

    server.stop().await;
}

#[tokio::test]
async fn unparseable_event_is_a_server_error() {
    let server = spawn_server(MockSlack::spawn().await).await;

    let response = reqwest::Client::new()
        .post(server.url("/slack/events"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("events request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.expect("body").is_empty());

    server.stop().await;
}
