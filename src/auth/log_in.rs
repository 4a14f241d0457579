//! This file defines the routes for displaying the log-in page and handling log-in requests.

use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiError, RelayedCookies, SessionCookies},
    auth::{AuthState, redirect::normalize_redirect_url},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, loading_spinner, log_in_register, password_input,
        username_input,
    },
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid username or password";
const MISSING_CREDENTIALS_ERROR_MSG: &str = "Enter your username and password";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (username_input(username))
            (password_input("password", "Password", error_message))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The data entered by the user in the log-in form.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// The username entered during log-in.
    #[serde(default)]
    pub username: String,

    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// The body sent to the budget API to log in or register.
#[derive(Serialize)]
pub(super) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The budget API's answer to a log in or registration request.
#[derive(Deserialize)]
pub(super) struct SessionStarted {
    #[serde(default)]
    pub message: Option<String>,
}

/// Relay the session cookies in `headers` to the browser and send it on to `target`.
pub(super) fn session_started_response(headers: &HeaderMap, target: &str) -> Response {
    (
        RelayedCookies::from_backend(headers),
        HxRedirect(target.to_owned()),
        StatusCode::OK,
    )
        .into_response()
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the session cookie from the budget API is
/// relayed to the browser and the client is redirected to `redirect_url` or the
/// dashboard. The same happens if the budget API reports that the browser
/// already has a valid session. Otherwise, the form is returned with an error
/// message explaining the problem.
pub async fn post_log_in(
    State(state): State<AuthState>,
    session: SessionCookies,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let target = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);
    let username = user_data.username.trim();

    if username.is_empty() || user_data.password.is_empty() {
        return log_in_form(username, Some(MISSING_CREDENTIALS_ERROR_MSG), redirect_url)
            .into_response();
    }

    let credentials = Credentials {
        username,
        password: &user_data.password,
    };

    match state
        .api
        .post_json::<SessionStarted, _>(endpoints::backend::LOG_IN, &credentials, &session)
        .await
    {
        Ok(response) => {
            tracing::info!(
                "Logged in {username}: {}",
                response.body.message.as_deref().unwrap_or("no message")
            );

            session_started_response(&response.headers, target)
        }
        // The budget API redirects log in requests from a session that is still valid.
        Err(ApiError::Redirected {
            location, headers, ..
        }) => {
            tracing::info!("{username} already has a session, the budget API redirected to {location:?}");
            session_started_response(&headers, target)
        }
        Err(ApiError::AuthenticationRequired) => {
            log_in_form(username, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not log in {username}: {error}");
            log_in_form(username, Some(&error.user_message()), redirect_url).into_response()
        }
    }
}
