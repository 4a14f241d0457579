//! Helpers for redirect URLs during authentication flows.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::{HX_CURRENT_URL, HX_REQUEST, HxRedirect};
use tracing::{error, warn};

use crate::endpoints;

fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !is_local_path(redirect_url) {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW
}

/// The path and query of `raw_url` if it points to a page on this server.
pub(crate) fn normalize_local_path(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_local_path(path_and_query).then(|| path_and_query.to_owned())
}

/// Like [normalize_local_path], but also rejects the log in page to avoid redirect loops.
pub(crate) fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    normalize_local_path(raw_url).filter(|url| is_safe_redirect_url(url))
}

fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log in page URL, with `redirect_target` as the page to return to afterwards.
pub(crate) fn log_in_url(redirect_target: Option<&str>) -> String {
    let Some(redirect_target) = redirect_target else {
        return endpoints::LOG_IN_VIEW.to_owned();
    };

    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN_VIEW, param),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// Send the browser to `url`.
///
/// htmx requests get an `HX-Redirect` header so that htmx performs a full
/// page navigation instead of swapping the response into the page.
pub(crate) fn navigate_to(is_htmx: bool, url: &str) -> Response {
    if is_htmx {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}

/// The response for a request the budget API refused because the session is missing or expired.
///
/// Extracted from the incoming request so it knows whether the request came
/// from htmx and which page the user was on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogInRedirect {
    is_htmx: bool,
    redirect_target: Option<String>,
}

impl LogInRedirect {
    #[cfg(test)]
    pub(crate) fn for_htmx(redirect_target: Option<String>) -> Self {
        Self {
            is_htmx: true,
            redirect_target,
        }
    }

    fn from_parts(parts: &Parts) -> Self {
        let is_htmx = parts
            .headers
            .get(HX_REQUEST)
            .and_then(|header| header.to_str().ok())
            .map(|header| header.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let redirect_target = if parts.uri.path().starts_with("/api") {
            redirect_target_from_hx_request(parts, is_htmx)
        } else {
            parts
                .uri
                .path_and_query()
                .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
        };

        Self {
            is_htmx,
            redirect_target,
        }
    }
}

fn redirect_target_from_hx_request(parts: &Parts, is_htmx: bool) -> Option<String> {
    if !is_htmx {
        warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let current_url = match parts
        .headers
        .get(HX_CURRENT_URL)
        .and_then(|header| header.to_str().ok())
    {
        Some(value) => value,
        None => {
            warn!("Missing HX-Current-URL header for /api request.");
            return None;
        }
    };

    let redirect_url = normalize_hx_current_url(current_url);
    if redirect_url.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

impl<S> FromRequestParts<S> for LogInRedirect
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

impl IntoResponse for LogInRedirect {
    fn into_response(self) -> Response {
        navigate_to(
            self.is_htmx,
            &log_in_url(self.redirect_target.as_deref()),
        )
    }
}
