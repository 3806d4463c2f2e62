use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Coarse classification of a remote failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    BadRequest,
    Server,
    /// No response: DNS, connect, TLS or a dropped connection.
    Transport,
    /// Response arrived but could not be decoded.
    Decode,
    /// The request could not be formed locally.
    Invalid,
}

impl RemoteErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => RemoteErrorKind::NotFound,
            409 => RemoteErrorKind::Conflict,
            401 | 403 => RemoteErrorKind::Unauthorized,
            400..=499 => RemoteErrorKind::BadRequest,
            _ => RemoteErrorKind::Server,
        }
    }

    /// Transient failures may succeed if the caller tries again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteErrorKind::Server | RemoteErrorKind::Transport)
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::Unauthorized => "unauthorized",
            RemoteErrorKind::BadRequest => "bad request",
            RemoteErrorKind::Server => "server error",
            RemoteErrorKind::Transport => "transport error",
            RemoteErrorKind::Decode => "decode error",
            RemoteErrorKind::Invalid => "invalid request",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub status: Option<u16>,
    pub message: String,
    /// Machine-readable type from the error body, e.g. `row_not_found`.
    pub error_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self { kind, status: None, message: message.into(), error_type: None }
    }

    /// Build from a non-success HTTP response, using the JSON error body when it parses.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (message, error_type) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(b) => (b.message, b.error_type),
            Err(_) if body.trim().is_empty() => (format!("HTTP {status}"), None),
            Err(_) => (body.trim().to_string(), None),
        };
        Self { kind: RemoteErrorKind::from_status(status), status: Some(status), message, error_type }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: Some(404), ..Self::new(RemoteErrorKind::NotFound, message) }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self { status: Some(409), ..Self::new(RemoteErrorKind::Conflict, message) }
    }

    pub fn transport(message: impl Into<String>) -> Self { Self::new(RemoteErrorKind::Transport, message) }

    pub fn decode(message: impl Into<String>) -> Self { Self::new(RemoteErrorKind::Decode, message) }

    pub fn invalid(message: impl Into<String>) -> Self { Self::new(RemoteErrorKind::Invalid, message) }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return RemoteError::decode(e.to_string());
        }
        if e.is_builder() {
            return RemoteError::invalid(e.to_string());
        }
        match e.status() {
            Some(status) => RemoteError::from_response(status.as_u16(), &e.to_string()),
            None => RemoteError::transport(e.to_string()),
        }
    }
}
