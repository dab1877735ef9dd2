//! Network Layer
//!
//! Loopback HTTP ingestion: wire parsing, token check, request
//! validation and the worker that ties them to the shared service.

pub mod auth;
pub mod protocol;
pub mod server;
pub mod wire;

pub use auth::{AuthConfig, AuthError, validate_token};
pub use protocol::{Rejection, StatusCode, validate_request};
pub use server::{IngestionServer, ServerError};
pub use wire::{RawRequest, RequestParser, WireError};
