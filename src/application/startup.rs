use std::{future::Future, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    application::{
        config::{Args, RuntimeConfig},
        reconcile,
        state::SharedState,
    },
    domain::error::DomainError,
    interfaces::http,
    platform::{SlackApi, SlackWebClient},
};

pub async fn run(args: Args) -> Result<(), DomainError> {
    let config = RuntimeConfig::from_args(args)
        .map_err(|error| DomainError::InvalidRequest(format!("configuration error: {error}")))?;

    init_logging(&config.log_filter, config.json_logs)?;

    let slack = SlackWebClient::new(
        &config.slack_api_base_url,
        &config.slack_bot_token,
        config.slack_api_timeout,
    )?;
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .map_err(|error| DomainError::Unavailable(format!("failed to bind listener: {error}")))?;

    let signal = shutdown_signal();
    run_with_listener(listener, config, Arc::new(slack), signal).await
}

/// Builds the service state against `slack`, starts the refresh loop and serves until `shutdown`
/// resolves. Fails before serving when the data directory or the bot token is unusable.
pub async fn run_with_listener(
    listener: TcpListener,
    config: RuntimeConfig,
    slack: Arc<dyn SlackApi>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DomainError> {
    info!(
        "starting connect-manager host={} port={} data_dir={} signature_checks={}",
        config.host,
        config.port,
        config.data_dir.display(),
        config.slack_signing_secret.is_some()
    );

    let state = SharedState::new(config, slack).await?;
    info!("authenticated as slack user {}", state.bot().user_id);

    let refresh_task = reconcile::spawn_refresh_loop(state.clone());
    let serve_result = http::serve(listener, state, shutdown).await;

    if let Some(task) = refresh_task {
        task.abort();
        if let Err(error) = task.await
            && !error.is_cancelled()
        {
            warn!("user refresh task ended abnormally: {error}");
        }
    }

    serve_result
}

fn init_logging(filter: &str, json_logs: bool) -> Result<(), DomainError> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(env_filter).with_target(false);

    if json_logs {
        builder.json().try_init().map_err(|error| {
            DomainError::Unavailable(format!("failed to initialize logger: {error}"))
        })?;
    } else {
        builder.compact().try_init().map_err(|error| {
            DomainError::Unavailable(format!("failed to initialize logger: {error}"))
        })?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
