use std::time::Duration;

use connect_manager::security::signature::SlackSignatureVerifier;

use super::support::{MockSlack, spawn_server_with};

const SECRET: &str = "integration-signing-secret";

#[tokio::test]
async fn signed_requests_pass_and_unsigned_are_rejected() {
    let server = spawn_server_with(MockSlack::spawn().await, |config| {
        config.slack_signing_secret = Some(SECRET.to_owned());
    })
    .await;
    let client = reqwest::Client::new();
    let body = "command=%2Fconnect&text=create-team+eng&channel_id=C1&channel_name=home&user_id=U1";

    let unsigned = client
        .post(server.url("/slack/command"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .expect("command request should complete");
    assert_eq!(unsigned.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert!(unsigned.text().await.expect("body").is_empty());

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = SlackSignatureVerifier::new(SECRET, Duration::from_secs(300))
        .sign(&timestamp, body.as_bytes())
        .expect("signature");

    let forged = client
        .post(server.url("/slack/command"))
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-slack-request-timestamp", &timestamp)
        .header("x-slack-signature", "v0=deadbeef")
        .body(body)
        .send()
        .await
        .expect("command request should complete");
    assert_eq!(forged.status(), reqwest::StatusCode::UNAUTHORIZED);

    let signed = client
        .post(server.url("/slack/command"))
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-slack-request-timestamp", &timestamp)
        .header("x-slack-signature", &signature)
        .body(body)
        .send()
        .await
        .expect("command request should complete");
    assert_eq!(signed.status(), reqwest::StatusCode::OK);
    let payload: serde_json::Value = signed.json().await.expect("json reply");
    assert_eq!(payload["text"], "Team 'eng' has been created.");

    let health = reqwest::get(server.url("/healthz"))
        .await
        .expect("healthz endpoint should respond");
    assert!(health.status().is_success());

    server.stop().await;
}
