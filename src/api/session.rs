//! The session credential passed between the browser and the budget API.
//!
//! The budget API identifies the user with a cookie. The browser sends that
//! cookie to this server, which forwards it on every API call, and any
//! `Set-Cookie` headers the API answers with are relayed back to the browser.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::Cookie;

/// The cookies the browser sent with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SessionCookies(Option<String>);

impl SessionCookies {
    /// Collect the `Cookie` headers of a request into a single header value.
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        let cookies: Vec<&str> = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();

        if cookies.is_empty() {
            Self(None)
        } else {
            Self(Some(cookies.join("; ")))
        }
    }

    /// The value for the `Cookie` header of an API request, if the browser sent any cookies.
    pub(crate) fn header_value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn new(cookie: &str) -> Self {
        Self(Some(cookie.to_owned()))
    }
}

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// `Set-Cookie` headers from an API response, rewritten for the browser.
///
/// The `Domain` attribute is removed so the cookie is stored for this
/// server's origin, which is where the browser sends its requests.
#[derive(Debug, Default)]
pub(crate) struct RelayedCookies(Vec<HeaderValue>);

impl RelayedCookies {
    pub(crate) fn from_backend(headers: &HeaderMap) -> Self {
        let cookies = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| {
                let raw = value
                    .to_str()
                    .inspect_err(|error| tracing::warn!("Ignoring non-ASCII Set-Cookie: {error}"))
                    .ok()?;
                let mut cookie = Cookie::parse(raw.to_owned())
                    .inspect_err(|error| tracing::warn!("Ignoring malformed Set-Cookie: {error}"))
                    .ok()?;
                cookie.unset_domain();

                HeaderValue::from_str(&cookie.to_string()).ok()
            })
            .collect();

        Self(cookies)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl IntoResponseParts for RelayedCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for value in self.0 {
            res.headers_mut().append(SET_COOKIE, value);
        }

        Ok(res)
    }
}
