//! Error type for the DKG client.
//!
//! # Design
//! Every failure a caller can observe is one `DkgError` variant. Validation
//! errors are returned synchronously, before a request future exists; the
//! remaining variants arrive through the future's `Err` channel. Nothing in the
//! pipeline downgrades one variant into another, so callers can branch on the
//! kind (e.g. retry on `Transport`, give up on `Http { status: 400.. }`).

/// Errors returned by `DkgClient` builders and `DkgNode` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DkgError {
    /// Caller input was rejected before any network call was attempted.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The node answered with a non-2xx status. `body` is the raw response
    /// text, passed through unchanged even when it is a JSON error payload.
    #[error("status code: {status}{}", reason_suffix(.body))]
    Http { status: u16, body: String },

    /// The request never produced an HTTP response: connect failure, timeout,
    /// TLS failure, truncated body, or any other unclassified send error.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body does not match the requested shape.
    #[error("unable to parse response body: {0}")]
    ResponseBody(String),

    /// The target and path/params could not be assembled into a URL.
    #[error("unable to build request uri: {0}")]
    Uri(String),
}

impl DkgError {
    /// HTTP status code, for `Http` errors only.
    pub fn status(&self) -> Option<u16> {
        match self {
            DkgError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DkgError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, DkgError::Transport(_))
    }
}

fn reason_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(", reason phrase: {body}")
    }
}
