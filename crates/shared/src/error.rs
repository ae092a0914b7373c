use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the platform exposure manager.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "message", rename_all = "snake_case")]
pub enum ExposureManagerError {
    #[error("exposure notifications are not supported on this device")]
    Unsupported,
    #[error("exposure notification request was rejected: {0}")]
    Rejected(String),
    #[error("platform call timed out after {0}ms")]
    Timeout(u64),
    #[error("platform error: {0}")]
    Internal(String),
}

/// Failure from the exposure data controller.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum ExposureDataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("server responded with status {status}")]
    ServerError { status: u16 },
    #[error("failed to decode server response: {0}")]
    ResponseDecode(String),
    #[error("request timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}
