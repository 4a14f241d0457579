//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, error_page::ErrorPage, transaction::ValidationError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The HTTP client used to talk to the budget API could not be created.
    ///
    /// This usually means the TLS backend could not be initialised.
    #[error("could not create the HTTP client: {0}")]
    HttpClientError(String),

    /// The backend URL given at start-up is not an absolute http(s) URL.
    #[error("invalid budget API URL \"{0}\"")]
    InvalidApiUrl(String),

    /// The user submitted a form that did not pass validation.
    ///
    /// No request is sent to the budget API when this happens.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => ErrorPage::internal(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            )
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    ///
    /// Intended for htmx form submissions where the response is swapped into
    /// the alert container rather than replacing the page.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::Validation(error) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::error(
                    "Check the transaction details",
                    &capitalise_first_char(&error.to_string()),
                ),
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::error(
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::error(
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details.",
                    ),
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        test_utils::{parse_html_document, parse_html_fragment},
        transaction::ValidationError,
    };

    #[tokio::test]
    async fn validation_error_renders_alert_with_reason() {
        let response = Error::from(ValidationError::EmptyDescription).into_alert_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("Description must not be empty"),
            "alert should explain the problem, got {text:?}"
        );
    }

    #[tokio::test]
    async fn invalid_timezone_renders_error_page() {
        let response = Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Mars/Olympus_Mons"));
    }
}
