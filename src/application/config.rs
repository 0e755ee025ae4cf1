use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{ArgAction, Parser};

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "connect-manager",
    version,
    about = "Slack slash-command service for managing teams of Slack Connect users"
)]
pub struct Args {
    #[arg(long, env = "CONNECT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "CONNECT_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: String,

    #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
    pub slack_signing_secret: Option<String>,

    #[arg(long, env = "SLACK_API_BASE_URL", default_value = DEFAULT_SLACK_API_BASE_URL)]
    pub slack_api_base_url: String,

    #[arg(long, env = "SLACK_API_TIMEOUT_MS", default_value_t = 10_000)]
    pub slack_api_timeout_ms: u64,

    #[arg(long, env = "CONNECT_COMMAND_NAME", default_value = "/connect")]
    pub command_name: String,

    #[arg(long, env = "CONNECT_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    #[arg(long, env = "CONNECT_REFRESH_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub refresh_enabled: bool,

    #[arg(long, env = "CONNECT_REFRESH_INTERVAL_MS", default_value_t = 10_000)]
    pub refresh_interval_ms: u64,

    #[arg(long, env = "CONNECT_SIGNATURE_MAX_SKEW_SECS", default_value_t = 300)]
    pub signature_max_skew_secs: u64,

    #[arg(long, env = "CONNECT_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,

    #[arg(long, env = "CONNECT_JSON_LOGS")]
    pub json_logs: bool,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub host: IpAddr,
    pub port: u16,
    pub slack_bot_token: String,
    pub slack_signing_secret: Option<String>,
    pub slack_api_base_url: String,
    pub slack_api_timeout: Duration,
    pub command_name: String,
    pub data_dir: PathBuf,
    pub refresh_enabled: bool,
    pub refresh_interval: Duration,
    pub signature_max_skew: Duration,
    pub max_body_bytes: usize,
    pub log_filter: String,
    pub json_logs: bool,
}

impl RuntimeConfig {
    pub fn from_args(args: Args) -> Result<Self, String> {
        let slack_bot_token = normalize_secret(Some(args.slack_bot_token))
            .ok_or_else(|| "SLACK_BOT_TOKEN must not be empty".to_owned())?;

        if args.port == 0 {
            return Err("port must be greater than 0".to_owned());
        }
        if args.slack_api_timeout_ms == 0 {
            return Err("slack_api_timeout_ms must be greater than 0".to_owned());
        }
        if args.refresh_interval_ms == 0 {
            return Err("refresh_interval_ms must be greater than 0".to_owned());
        }
        if args.max_body_bytes == 0 {
            return Err("max_body_bytes must be greater than 0".to_owned());
        }

        let command_name = args.command_name.trim().to_owned();
        if !command_name.starts_with('/') || command_name.len() < 2 {
            return Err(format!(
                "command_name must look like a slash command, got '{command_name}'"
            ));
        }

        let slack_api_base_url = args.slack_api_base_url.trim().to_owned();
        if slack_api_base_url.is_empty() {
            return Err("slack_api_base_url must not be empty".to_owned());
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            slack_bot_token,
            slack_signing_secret: normalize_secret(args.slack_signing_secret),
            slack_api_base_url,
            slack_api_timeout: Duration::from_millis(args.slack_api_timeout_ms),
            command_name,
            data_dir: args.data_dir,
            refresh_enabled: args.refresh_enabled,
            refresh_interval: Duration::from_millis(args.refresh_interval_ms),
            signature_max_skew: Duration::from_secs(args.signature_max_skew_secs),
            max_body_bytes: args.max_body_bytes,
            log_filter: args.log_filter,
            json_logs: args.json_logs,
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn for_test(host: IpAddr, port: u16, data_dir: PathBuf) -> Self {
        Self {
            host,
            port,
            slack_bot_token: "xoxb-test".to_owned(),
            slack_signing_secret: None,
            slack_api_base_url: DEFAULT_SLACK_API_BASE_URL.to_owned(),
            slack_api_timeout: Duration::from_millis(2_000),
            command_name: "/connect".to_owned(),
            data_dir,
            refresh_enabled: false,
            refresh_interval: Duration::from_millis(200),
            signature_max_skew: Duration::from_secs(300),
            max_body_bytes: 64 * 1024,
            log_filter: "warn".to_owned(),
            json_logs: false,
        }
    }
}

fn normalize_secret(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}
