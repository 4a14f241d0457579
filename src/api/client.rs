use reqwest::{
    Method, RequestBuilder, StatusCode,
    header::{ACCEPT, COOKIE, HeaderMap, LOCATION},
    redirect,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Error,
    api::{ApiError, SessionCookies},
    endpoints,
};

/// Client for the budget API at a fixed origin.
///
/// Cloning is cheap, clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

/// A decoded JSON body with the headers it came with.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// The decoded JSON body.
    pub body: T,
    /// The response headers, e.g. `Set-Cookie` and `X-User-Info`.
    pub headers: HeaderMap,
}

impl ApiClient {
    /// Create a client for the API served at `base_url`, e.g. "http://localhost:5000".
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an http(s) URL or the HTTP client
    /// cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidApiUrl(base_url.to_owned()));
        }

        // Redirects are not followed so that a redirect to the API's log in
        // page can be recognised as a missing session.
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|error| Error::HttpClientError(error.to_string()))?;

        Ok(Self {
            base_url: base_url.to_owned(),
            client,
        })
    }

    /// The origin requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` with the session cookie and `Accept: application/json`.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        session: &SessionCookies,
    ) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json");

        match session.header_value() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    /// GET `path` and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &SessionCookies,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.fetch_json(self.request(Method::GET, path, session)).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub(crate) async fn post_json<T, B>(
        &self,
        path: &str,
        body: &B,
        session: &SessionCookies,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch_json(self.request(Method::POST, path, session).json(body))
            .await
    }

    /// Send `request` and interpret the response.
    ///
    /// # Errors
    /// - [ApiError::AuthenticationRequired] if the API answers 401 or redirects to its log in page.
    /// - [ApiError::Redirected] if the API redirects anywhere else.
    /// - [ApiError::Server] for any other non-success status.
    /// - [ApiError::Network] if the request could not be completed.
    /// - [ApiError::Decode] if a success response is not the expected JSON.
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let request = request.build().map_err(|error| {
            tracing::error!("Could not build request for the budget API: {error}");
            ApiError::Network(error.to_string())
        })?;
        let method = request.method().clone();
        let path = request.url().path().to_owned();

        tracing::debug!("Sending {method} {path} to the budget API");
        let response = self.client.execute(request).await.map_err(|error| {
            tracing::error!("{method} {path} failed: {error}");
            ApiError::Network(error.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::UNAUTHORIZED || is_log_in_redirect(status, &headers) {
            tracing::info!("{method} {path} requires authentication ({status})");
            return Err(ApiError::AuthenticationRequired);
        }

        if status.is_redirection() {
            let location = headers
                .get(LOCATION)
                .and_then(|location| location.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            tracing::info!("{method} {path} redirected to {location:?} ({status})");
            return Err(ApiError::Redirected {
                status: status.as_u16(),
                location,
                headers,
            });
        }

        let bytes = response.bytes().await.map_err(|error| {
            tracing::error!("Could not read the response body of {method} {path}: {error}");
            ApiError::Network(error.to_string())
        })?;

        if !status.is_success() {
            let error = ApiError::from_error_response(status, &bytes);
            tracing::warn!("{method} {path} returned {status}: {error}");
            return Err(error);
        }

        let body = serde_json::from_slice(&bytes).map_err(|error| {
            tracing::error!("Could not decode the response of {method} {path}: {error}");
            ApiError::Decode(error.to_string())
        })?;

        Ok(ApiResponse { body, headers })
    }
}

fn is_log_in_redirect(status: StatusCode, headers: &HeaderMap) -> bool {
    if !status.is_redirection() {
        return false;
    }

    headers
        .get(LOCATION)
        .and_then(|location| location.to_str().ok())
        .map(|location| {
            let path = location.split_once('?').map_or(location, |(path, _)| path);
            path.ends_with(endpoints::backend::LOG_IN)
        })
        .unwrap_or(false)
}
