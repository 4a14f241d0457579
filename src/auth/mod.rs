//! Log in, registration and log out against the budget API.
//!
//! The budget API owns the session. These handlers forward the user's
//! credentials, relay the session cookie it sets back to the browser and
//! send the browser on to the right page.

mod log_in;
mod log_out;
mod redirect;
mod register;

use axum::extract::FromRef;

use crate::{AppState, api::ApiClient};

pub(crate) use log_in::{get_log_in_page, post_log_in};
pub(crate) use log_out::get_log_out;
pub(crate) use redirect::{LogInRedirect, navigate_to};
pub(crate) use register::{get_register_page, post_register};

/// The state needed to log in, register or log out.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The client for the budget API.
    pub api: ApiClient,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
        }
    }
}
