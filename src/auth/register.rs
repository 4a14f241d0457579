//! The registration page for creating an account on the budget API.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    api::{ApiError, SessionCookies},
    auth::{
        AuthState,
        log_in::{Credentials, SessionStarted, session_started_response},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, loading_spinner, log_in_register, password_input,
        username_input,
    },
};

const PASSWORD_MISMATCH_ERROR_MSG: &str = "Passwords do not match";
const MISSING_FIELDS_ERROR_MSG: &str = "Enter a username and password";

#[derive(Default)]
struct FormErrors<'a> {
    /// Shown below the password field.
    password: Option<&'a str>,
    /// Shown below the confirm password field.
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, errors: FormErrors<'_>) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username))
            (password_input("password", "Password", errors.password))
            (password_input("confirm_password", "Confirm Password", errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", FormErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The data entered by the user in the registration form.
#[derive(Clone, Deserialize)]
pub struct RegisterData {
    /// The username to register.
    #[serde(default)]
    pub username: String,
    /// The password for the new account.
    #[serde(default)]
    pub password: String,
    /// The password typed a second time.
    #[serde(default)]
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// On success the budget API starts a session for the new user, the session
/// cookie is relayed to the browser and the client is redirected to the
/// dashboard. Otherwise the form is returned with the problem explained.
pub async fn post_register(
    State(state): State<AuthState>,
    session: SessionCookies,
    Form(user_data): Form<RegisterData>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() || user_data.password.is_empty() {
        return registration_form(
            username,
            FormErrors {
                password: Some(MISSING_FIELDS_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response();
    }

    if user_data.password != user_data.confirm_password {
        return registration_form(
            username,
            FormErrors {
                confirm_password: Some(PASSWORD_MISMATCH_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response();
    }

    let credentials = Credentials {
        username,
        password: &user_data.password,
    };

    match state
        .api
        .post_json::<SessionStarted, _>(endpoints::backend::REGISTER, &credentials, &session)
        .await
    {
        Ok(response) => {
            tracing::info!(
                "Registered {username}: {}",
                response.body.message.as_deref().unwrap_or("no message")
            );

            session_started_response(&response.headers, endpoints::DASHBOARD_VIEW)
        }
        Err(ApiError::Redirected {
            location, headers, ..
        }) => {
            tracing::info!("{username} already has a session, the budget API redirected to {location:?}");
            session_started_response(&headers, endpoints::DASHBOARD_VIEW)
        }
        Err(error) => {
            // The budget API answers 409 with "Username already exists".
            if !matches!(error, ApiError::Server { status: 409, .. }) {
                tracing::error!("Could not register {username}: {error}");
            }

            let message = error.user_message();
            registration_form(
                username,
                FormErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response()
        }
    }
}
