pub mod http;
pub mod slack_http;
