//! The client for the remote budget API.
//!
//! Every call forwards the browser's cookies as the session credential and
//! interprets the response the same way:
//! - 2xx: the JSON body is decoded and returned together with the headers.
//! - 401: [ApiError::AuthenticationRequired], the caller redirects to log in.
//! - anything else: [ApiError::Server] with the message from the payload.

mod client;
mod error;
mod session;

pub use client::ApiClient;
pub use error::ApiError;
pub(crate) use session::{RelayedCookies, SessionCookies};
