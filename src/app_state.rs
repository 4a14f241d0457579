//! Implements a struct that holds the state of the frontend server.

use crate::{Error, api::ApiClient, timezone::get_local_offset};

/// The state of the frontend server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The client for the remote budget API.
    pub api: ApiClient,

    /// The label appended to every displayed amount, e.g. "BGN".
    pub currency: String,

    /// The local timezone as a canonical timezone name, e.g. "Europe/Sofia".
    pub local_timezone: String,
}

impl AppState {
    /// Create a new [AppState] that talks to the budget API at `api_url`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Europe/Sofia".
    ///
    /// # Errors
    /// Returns an error if the timezone is unknown, the URL is not an http(s)
    /// URL, or the HTTP client cannot be created.
    pub fn new(api_url: &str, currency: &str, local_timezone: &str) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            api: ApiClient::new(api_url)?,
            currency: currency.to_owned(),
            local_timezone: local_timezone.to_owned(),
        })
    }
}
