use super::support::{MockSlack, eventually, spawn_server, spawn_server_with};

#[tokio::test]
async fn team_lifecycle_over_slash_commands() {
    let slack = MockSlack::spawn()
        .await
        .with_user("U123", "ada.lovelace", "Ada")
        .with_user("U456", "grace", "");
    let server = spawn_server(slack).await;

    assert_eq!(server.command("create-team eng").await, "Team 'eng' has been created.");
    assert_eq!(server.command("create-team eng").await, "Team 'eng' already exists.");
    assert_eq!(
        server.command("add eng U123").await,
        "Added user Ada (U123) to team 'eng'."
    );
    assert_eq!(
        server.command("add eng U456").await,
        "Added user grace (U456) to team 'eng'."
    );
    assert_eq!(
        server.command("print members eng").await,
        "Members of team 'eng': Ada (U123), grace (U456)"
    );
    assert_eq!(
        server.command("add eng U999").await,
        "Error getting user info: user_not_found"
    );
    assert_eq!(
        server.command("remove eng U456").await,
        "Removed user U456 from team 'eng'."
    );
    assert_eq!(server.command("print teams").await, "Teams: eng");

    let teams = server.read_document("teams.json");
    assert_eq!(teams["teams"]["eng"]["members"][0]["member_id"], "U123");
    assert_eq!(teams["teams"]["eng"]["members"][0]["name"], "Ada");
    assert_eq!(teams["teams"]["eng"]["members"][0]["channels"], serde_json::json!({}));
    let users = server.read_document("users.json");
    assert_eq!(users["U123"]["name"], "Ada");
    assert!(users["U123"]["updatedAt"].is_string());

    assert_eq!(server.command("remove-team eng").await, "Team 'eng' has been removed.");
    assert_eq!(server.command("print teams").await, "No teams found.");

    server.stop().await;
}

#[tokio::test]
async fn help_lists_commands_with_configured_trigger() {
    let server = spawn_server(MockSlack::spawn().await).await;

    let help = server.command("help").await;
    assert!(help.starts_with("Available commands:"));
    assert!(help.contains("- /connect add <team> <member_id>"));
    assert_eq!(server.command("").await, help);
    assert_eq!(server.command("launch-rockets").await, help);
    assert_eq!(
        server.command("print").await,
        "Please specify what to print: teams, channels, or members <team>."
    );

    server.stop().await;
}

#[tokio::test]
async fn add_channel_joins_and_backfills_members_across_pages() {
    let slack = MockSlack::spawn()
        .await
        .with_user("U1", "ada", "Ada")
        .with_user("U2", "grace", "Grace")
        .with_bot("B1", "deploybot")
        .with_channel("C_HOME", &["U1", "B1", "U2"]);
    let server = spawn_server(slack).await;
    server.command("create-team eng").await;
    server.command("add eng U2").await;

    assert_eq!(
        server.command("add-channel").await,
        "Channel #home has been added to the tracking list."
    );
    assert_eq!(server.slack.joined(), vec!["C_HOME".to_owned()]);
    assert_eq!(server.command("print channels").await, "Channels: home");

    let backfilled = eventually(|| {
        let users = server.read_document("users.json");
        users["U1"]["channels"]["C_HOME"] == "U1" && users["U2"]["channels"]["C_HOME"] == "U2"
    })
    .await;
    assert!(backfilled, "detached refresh should record every human member");
    assert_eq!(server.slack.member_pages_served(), 2);

    let users = server.read_document("users.json");
    assert!(users.get("B1").is_none());
    let backfilled_team = eventually(|| {
        let teams = server.read_document("teams.json");
        teams["teams"]["eng"]["members"][0]["channels"]["C_HOME"] == "U2"
    })
    .await;
    assert!(backfilled_team);

    assert_eq!(
        server.command("add-channel").await,
        "Channel #home is already being tracked."
    );
    assert_eq!(server.slack.joined().len(), 1);

    assert_eq!(
        server.command("remove-channel home").await,
        "Channel #home has been removed from the tracking list."
    );
    assert_eq!(
        server.command("remove-channel home").await,
        "Channel #home is not being tracked."
    );

    server.stop().await;
}

#[tokio::test]
async fn ping_posts_one_message_with_mentions() {
    let slack = MockSlack::spawn()
        .await
        .with_user("U1", "ada", "Ada")
        .with_user("U2", "grace", "Grace")
        .with_channel("C_LAUNCH", &[]);
    let server = spawn_server(slack).await;
    server.command("create-team eng").await;
    server.command("create-team empty").await;
    server.command("add eng U1").await;
    server.command("add eng U2").await;
    server.command_in("add-channel", "C_LAUNCH", "launch").await;

    assert_eq!(
        server.command("ping eng launch").await,
        "Successfully pinged team 'eng' in #launch."
    );
    assert_eq!(
        server.slack.posted(),
        vec![("C_LAUNCH".to_owned(), "<@U1> <@U2>".to_owned())]
    );

    assert_eq!(
        server.command("ping empty launch").await,
        "No members of team 'empty' found."
    );
    assert_eq!(server.command("ping eng mars").await, "Channel 'mars' not found.");
    assert_eq!(server.slack.posted().len(), 1);

    server.slack.fail_posts_to("C_LAUNCH");
    assert_eq!(
        server.command("ping eng launch").await,
        "Error pinging team: not_in_channel"
    );

    server.stop().await;
}

#[tokio::test]
async fn periodic_refresh_updates_renamed_members() {
    let slack = MockSlack::spawn()
        .await
        .with_user("U1", "ada", "Ada")
        .with_channel("C_HOME", &["U1"]);
    let server = spawn_server_with(slack, |config| config.refresh_enabled = true).await;
    server.command("create-team eng").await;
    server.command("add eng U1").await;
    server.command("add-channel").await;

    server.slack.set_display_name("U1", "Countess");
    let renamed = eventually(|| {
        let teams = server.read_document("teams.json");
        teams["teams"]["eng"]["members"][0]["name"] == "Countess"
    })
    .await;
    assert!(renamed, "refresh loop should pick up the new display name");

    server.stop().await;
}

#[tokio::test]
async fn wrong_trigger_or_malformed_form_is_a_server_error() {
    let server = spawn_server(MockSlack::spawn().await).await;
    let client = reqwest::Client::new();

    let wrong = client
        .post(server.url("/slack/command"))
        .form(&[("command", "/other"), ("text", "print teams")])
        .send()
        .await
        .expect("command request should complete");
    assert_eq!(wrong.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(wrong.text().await.expect("body").is_empty());

    let malformed = client
        .post(server.url("/slack/command"))
        .header("content-type", "application/json")
        .body(r#"{"command":"/connect"}"#)
        .send()
        .await
        .expect("command request should complete");
    assert_eq!(malformed.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

    server.stop().await;
}
