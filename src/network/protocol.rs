//! Request Validation and Responses
//!
//! Classifies a fully read request as accepted (its JSON object is ready
//! to merge) or rejected with a status code, and encodes the fixed,
//! body-less responses the service sends back.

use serde_json::{Map, Value};
use tracing::debug;

use crate::network::auth::{validate_token, AuthConfig, AuthError};
use crate::network::wire::{RawRequest, WireError};

/// The only meaningful request target.
pub const GSI_PATH: &str = "/gsi";

/// The only accepted method.
pub const GSI_METHOD: &str = "POST";

/// User-Agent prefix the game client sends. Only logged, never enforced.
pub const EXPECTED_USER_AGENT_PREFIX: &str = "Valve/Steam HTTP Client";

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StatusCode {
    /// Update merged.
    NoContent = 204,
    /// Wrong method/path, malformed JSON, oversized or garbled request.
    BadRequest = 400,
    /// Missing or wrong `auth.token`.
    Unauthorized = 401,
}

impl StatusCode {
    /// Numeric code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Reason phrase.
    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
        }
    }
}

/// Why a request was not merged.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// Method is not `POST`.
    #[error("method not allowed: {0}")]
    WrongMethod(String),

    /// Path is not `/gsi`.
    #[error("unknown path: {0}")]
    WrongPath(String),

    /// Body is not well-formed JSON.
    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Request could not be read (head garbled or too large).
    #[error("protocol error: {0}")]
    Protocol(#[from] WireError),
}

impl Rejection {
    /// Status to answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Unauthorized(_) => StatusCode::Unauthorized,
            Rejection::WrongMethod(_)
            | Rejection::WrongPath(_)
            | Rejection::MalformedJson(_)
            | Rejection::Protocol(_) => StatusCode::BadRequest,
        }
    }
}

/// Validate a request, in order: method and path, JSON, token.
///
/// On success returns the payload object, ready to merge.
pub fn validate_request(req: &RawRequest, auth: &AuthConfig) -> Result<Map<String, Value>, Rejection> {
    if req.method != GSI_METHOD {
        return Err(Rejection::WrongMethod(req.method.clone()));
    }
    if req.path != GSI_PATH {
        return Err(Rejection::WrongPath(req.path.clone()));
    }

    match req.header("user-agent") {
        Some(ua) if ua.starts_with(EXPECTED_USER_AGENT_PREFIX) => {}
        ua => debug!(user_agent = ?ua, "unexpected User-Agent, accepting anyway"),
    }

    let payload: Value = serde_json::from_slice(&req.body)?;
    validate_token(&payload, auth)?;

    match payload {
        Value::Object(map) => Ok(map),
        // a valid token implies an object
        _ => Err(Rejection::Unauthorized(AuthError::MissingToken)),
    }
}

/// Encode a body-less response.
pub fn encode_response(status: StatusCode) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status.as_u16(),
        status.reason()
    )
}

// =============================================================================
// TESTS
// =============================================================================
