use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 錯誤分類，呼叫端依此分支而非依賴底層傳輸細節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    TransportFailure,
    UpstreamRejected,
    DecodeFailure,
    Timeout,
    AllCarriersFailed,
    Config,
}

/// A single carrier's failure, kept for the terminal comparison error.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierFailure {
    pub carrier: String,
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Error, Debug, Clone)]
pub enum ExpressError {
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Transport failure: {message}")]
    TransportFailure { message: String },

    #[error("Upstream rejected request ({code}): {message}")]
    UpstreamRejected { code: String, message: String },

    #[error("Failed to decode upstream response: {message}")]
    DecodeFailure { message: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("All {} carriers failed: {}", .failures.len(), summarize(.failures))]
    AllCarriersFailed { failures: Vec<CarrierFailure> },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn summarize(failures: &[CarrierFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({:?}: {})", f.carrier, f.kind, f.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExpressError {
    pub fn invalid_argument(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::UpstreamRejected { .. } => ErrorKind::UpstreamRejected,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::AllCarriersFailed { .. } => ErrorKind::AllCarriersFailed,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// 給使用者看的訊息，不含傳輸層細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidArgument { field, reason } => {
                format!("Missing or invalid `{}`: {}", field, reason)
            }
            Self::TransportFailure { .. } => {
                "Could not reach the courier data provider".to_string()
            }
            Self::UpstreamRejected { code, message } => {
                format!("The courier data provider rejected the request ({}): {}", code, message)
            }
            Self::DecodeFailure { .. } => {
                "The courier data provider returned an unreadable response".to_string()
            }
            Self::Timeout { timeout_ms } => {
                format!("The courier data provider did not answer within {}ms", timeout_ms)
            }
            Self::AllCarriersFailed { failures } => {
                format!("No carrier returned a price: {}", summarize(failures))
            }
            Self::Config { message } => format!("Invalid configuration: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "Provide a non-empty value for the named field",
            Self::TransportFailure { .. } | Self::Timeout { .. } => {
                "Check network connectivity and try again later"
            }
            Self::UpstreamRejected { .. } => {
                "Verify --customer and --auth_key and the carrier code"
            }
            Self::DecodeFailure { .. } => "Check that the configured endpoints are correct",
            Self::AllCarriersFailed { .. } => {
                "Check credentials, the carrier list and the origin/destination"
            }
            Self::Config { .. } => "Fix the configuration file or command-line flags",
        }
    }
}

impl From<reqwest::Error> for ExpressError {
    fn from(err: reqwest::Error) -> Self {
        // URL 可能帶有查詢參數，一律移除
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout { timeout_ms: 0 }
        } else if err.is_decode() {
            Self::DecodeFailure {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::UpstreamRejected {
                code: status.as_u16().to_string(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            }
        } else if err.is_connect() {
            Self::TransportFailure {
                message: "connection to upstream failed".to_string(),
            }
        } else {
            Self::TransportFailure {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ExpressError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeFailure {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpressError>;
