//! Dispatch, status classification and body decoding.
//!
//! One request goes through
//!
//! ```text
//! Built -> Dispatched -> Succeeded(body) -> Deserialized(T)
//!                                        -> ResponseBody error
//!                     -> Http error
//!                     -> Transport error
//! ```
//!
//! Every right-hand state is final. There is no retry and no polling here;
//! callers decide whether and when to send again.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::DkgError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{HandlerId, NodeInfo, ProofsResult, PublishResult, QueryResult, ResolveResult};

/// Send `request` and classify the outcome.
///
/// Errors produced by the transport are returned as-is; they are already
/// `DkgError` values and are never wrapped a second time.
pub async fn dispatch<T: Transport + ?Sized>(transport: &T, request: HttpRequest) -> Result<String, DkgError> {
    let request_line = request.request_line();
    debug!(request = %request_line, "sending request");

    let response = transport.send(request).await.inspect_err(|e| {
        error!(request = %request_line, error = %e, "request failed");
    })?;
    classify(response)
}

/// 2xx yields the body text; anything else is an `Http` error carrying the
/// status and the untouched body.
pub fn classify(response: HttpResponse) -> Result<String, DkgError> {
    if is_success(response.status) {
        return Ok(response.body);
    }
    warn!(status = response.status, body = %response.body, "unsuccessful response status");
    Err(DkgError::Http {
        status: response.status,
        body: response.body,
    })
}

pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Parse `body` as JSON into `T`.
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, DkgError> {
    serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "exception parsing response body content");
        DkgError::ResponseBody(e.to_string())
    })
}

/// A shape a successful response body can be turned into.
///
/// `String` is the passthrough shape: the body is returned unchanged without
/// parsing. Other implementations decode JSON via [`decode_json`].
pub trait FromBody: Sized {
    fn from_body(body: String) -> Result<Self, DkgError>;
}

impl FromBody for String {
    fn from_body(body: String) -> Result<Self, DkgError> {
        Ok(body)
    }
}

macro_rules! json_body {
    ($($ty:ty),* $(,)?) => {
        $(impl FromBody for $ty {
            fn from_body(body: String) -> Result<Self, DkgError> {
                decode_json(&body)
            }
        })*
    };
}

json_body!(
    Value,
    HandlerId,
    NodeInfo,
    PublishResult,
    ResolveResult,
    QueryResult,
    ProofsResult,
);

/// Classify a response and decode its body; the parse half of the
/// host-does-IO split.
pub fn parse<T: FromBody>(response: HttpResponse) -> Result<T, DkgError> {
    T::from_body(classify(response)?)
}
