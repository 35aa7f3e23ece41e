//! Error taxonomy for the search pipeline
//!
//! Only [`ValidationError`] ever reaches the caller of a search. Every
//! upstream failure is a [`SourceError`] that the adapter folds into its
//! [`SourceResult`](crate::sources::SourceResult) as an [`ErrorInfo`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rejection of a query before any upstream dispatch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("query value is empty")]
    EmptyValue,
    #[error("unknown field type: {0}")]
    UnknownField(String),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}

/// Failure of a single upstream call
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP 401/403 - key revoked or balance exhausted
    #[error("upstream rejected credentials (HTTP {status})")]
    Auth { status: u16 },
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// HTML (or anything but JSON) where JSON was expected
    #[error("unexpected content type '{content_type}' from upstream")]
    ContentType { content_type: String },
    #[error("malformed response body: {0}")]
    Decode(String),
    /// Well-formed response carrying an upstream-level error message
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("source is not configured: {0}")]
    NotConfigured(String),
}

impl SourceError {
    /// Whether a retry has a reasonable chance to succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::ContentType { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Auth { .. } | Self::Decode(_) | Self::Upstream(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotConfigured(_) => ErrorKind::Config,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Status { status, .. } if *status < 500 => ErrorKind::Upstream,
            _ => ErrorKind::Transient,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error classification exposed in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Transient,
    Upstream,
    Decode,
    Config,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Transient => write!(f, "transient"),
            Self::Upstream => write!(f, "upstream"),
            Self::Decode => write!(f, "decode"),
            Self::Config => write!(f, "config"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Serializable failure detail attached to a source result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            status: None,
        }
    }
}

impl From<&SourceError> for ErrorInfo {
    fn from(err: &SourceError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status(),
        }
    }
}
