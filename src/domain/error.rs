use thiserror::Error;

use crate::platform::SlackApiError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("slack error: {0}")]
    Platform(#[from] SlackApiError),
}
