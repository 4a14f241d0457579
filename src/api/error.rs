//! The ways a call to the budget API can fail.

use reqwest::{StatusCode, header::HeaderMap};
use serde::Deserialize;

/// An error from a call to the budget API.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// The API answered 401, the session is missing or has expired.
    ///
    /// This is never shown to the user, callers redirect to the log in page instead.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The API answered with a non-success status other than 401.
    ///
    /// `message` is the `error` or `message` field of the JSON body if there
    /// was one, otherwise a generic message based on the status code.
    #[error("{message}")]
    Server {
        /// The HTTP status code of the response.
        status: u16,
        /// The message to show to the user.
        message: String,
    },

    /// The API redirected somewhere other than its log in page.
    ///
    /// The API does this when a log in or registration request arrives with a
    /// session that is still valid, so `headers` may carry a refreshed cookie.
    #[error("the budget service redirected to \"{location}\" ({status})")]
    Redirected {
        /// The HTTP status code of the response.
        status: u16,
        /// The `Location` header, empty if there was none.
        location: String,
        /// The response headers.
        headers: HeaderMap,
    },

    /// The request could not be sent or the response could not be read.
    #[error("could not reach the budget service: {0}")]
    Network(String),

    /// The API answered with a success status but the body was not the expected JSON.
    #[error("unexpected response from the budget service: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Build a [ApiError::Server] from a non-success response body.
    pub(super) fn from_error_response(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .map(|message| message.trim().to_owned())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// The text to render in a panel that failed to load.
    ///
    /// Server messages are passed through, transport and decoding details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthenticationRequired => "Please log in again.".to_owned(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Redirected { .. } => {
                "The budget service sent an unexpected redirect. Please reload the page.".to_owned()
            }
            ApiError::Network(_) => {
                "Could not reach the budget service. Please try again.".to_owned()
            }
            ApiError::Decode(_) => {
                "The budget service sent a response that could not be read.".to_owned()
            }
        }
    }
}
