//! Custom error types for the host bridge.

use google_fit_client::FitError;
use serde::Serialize;
use thiserror::Error;

/// Bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("fit error: {0}")]
    Fit(#[from] FitError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error payload handed to the host's error callback. `code` lets the host
/// tell a failed fetch apart from an empty result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

impl ErrorInfo {
    pub const QUERY_FAILED: &'static str = "QUERY_FAILED";
    pub const QUERY_TIMEOUT: &'static str = "QUERY_TIMEOUT";
    pub const UNAUTHORIZED: &'static str = "UNAUTHORIZED";
    pub const INVALID_INPUT: &'static str = "INVALID_INPUT";
    pub const INTERNAL: &'static str = "INTERNAL";

    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&FitError> for ErrorInfo {
    fn from(err: &FitError) -> Self {
        let code = match err {
            FitError::QueryFailed { .. } | FitError::Http(_) | FitError::Decode(_) => {
                ErrorInfo::QUERY_FAILED
            }
            FitError::QueryTimeout(_) => ErrorInfo::QUERY_TIMEOUT,
            FitError::Unauthorized(_) => ErrorInfo::UNAUTHORIZED,
            FitError::InvalidInput(_) => ErrorInfo::INVALID_INPUT,
            FitError::InvalidTimestamp(_) | FitError::Config(_) => ErrorInfo::INTERNAL,
        };
        ErrorInfo::new(code, err.to_string())
    }
}

impl From<&BridgeError> for ErrorInfo {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::Fit(e) => e.into(),
            BridgeError::Protocol(m) => ErrorInfo::new(ErrorInfo::INVALID_INPUT, m.clone()),
            other => ErrorInfo::new(ErrorInfo::INTERNAL, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fit_errors_map_to_codes() {
        let info = ErrorInfo::from(&FitError::QueryTimeout(Duration::from_secs(60)));
        assert_eq!(info.code, ErrorInfo::QUERY_TIMEOUT);
        let info = ErrorInfo::from(&FitError::query_failed("offline"));
        assert_eq!(info.code, ErrorInfo::QUERY_FAILED);
        assert_eq!(info.message, "query failed: offline");
    }

    #[test]
    fn protocol_errors_are_invalid_input() {
        let info = ErrorInfo::from(&BridgeError::Protocol("unknown method".into()));
        assert_eq!(info.code, ErrorInfo::INVALID_INPUT);
    }
}
