//! Transport-level failures reported by backend adapters.

use thiserror::Error;

use crate::models::RawResponse;

/// Message marker some backends use for a socket-level timeout.
pub const SOCKET_TIMEOUT_MARKER: &str = "ESOCKETTIMEDOUT";

/// What went wrong during a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The backend answered with a non-success status.
    Http { status: u16 },
    /// The request timed out before a response arrived.
    Timeout,
    /// No response at all: DNS, refused connection, reset.
    Connection,
    /// A response arrived but its payload is unusable.
    Malformed,
}

/// A failed backend fetch.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Http { status },
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Connection,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Malformed,
            message: message.into(),
        }
    }

    /// Transport status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            BackendErrorKind::Http { status } => Some(status),
            _ => None,
        }
    }

    /// True when the status is one of `statuses`.
    pub fn status_in(&self, statuses: &[u16]) -> bool {
        self.status().is_some_and(|s| statuses.contains(&s))
    }

    /// True when the failure happened before any response was received.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.kind,
            BackendErrorKind::Timeout | BackendErrorKind::Connection
        )
    }

    /// True for timeouts, including ones only visible in the message.
    pub fn is_socket_timeout(&self) -> bool {
        self.kind == BackendErrorKind::Timeout || self.message.contains(SOCKET_TIMEOUT_MARKER)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("{}: {}", SOCKET_TIMEOUT_MARKER, err))
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else if err.is_decode() || err.is_body() {
            Self::malformed(err.to_string())
        } else {
            Self::connection(err.to_string())
        }
    }
}

/// Turn a reqwest response into a [`RawResponse`], failing on non-2xx statuses.
pub(crate) async fn read_response(
    provider: &str,
    response: reqwest::Response,
) -> Result<RawResponse, BackendError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::http(
            status.as_u16(),
            format!("{} returned HTTP {}: {}", provider, status, snippet(&body)),
        ));
    }

    Ok(RawResponse::new(status.as_u16(), content_type, body))
}

/// First 200 characters of a body, for log-friendly error messages.
pub(crate) fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
