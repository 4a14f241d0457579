//! Log-out route handler that ends the session on the budget API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use serde::Deserialize;

use crate::{
    alert::Alert,
    api::{ApiError, RelayedCookies, SessionCookies},
    auth::{AuthState, navigate_to, redirect::normalize_local_path},
    endpoints,
};

/// The budget API's answer to a log out request.
#[derive(Debug, Deserialize)]
struct LoggedOut {
    /// Where to send the browser next.
    #[serde(default)]
    redirect: Option<String>,
}

/// End the session on the budget API and send the client to the log-in page.
///
/// The redirect target given by the budget API is used if it is a local path.
/// If the budget API cannot be reached the client is still sent to the log-in
/// page, only an error response from the budget API is reported to the user.
pub async fn get_log_out(
    State(state): State<AuthState>,
    session: SessionCookies,
    HxRequest(is_htmx): HxRequest,
) -> Response {
    match state
        .api
        .get::<LoggedOut>(endpoints::backend::LOG_OUT, &session)
        .await
    {
        Ok(response) => {
            let target = response
                .body
                .redirect
                .as_deref()
                .and_then(normalize_local_path)
                .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned());

            (
                RelayedCookies::from_backend(&response.headers),
                navigate_to(is_htmx, &target),
            )
                .into_response()
        }
        Err(ApiError::AuthenticationRequired) => navigate_to(is_htmx, endpoints::LOG_IN_VIEW),
        Err(error @ ApiError::Server { .. }) => {
            tracing::error!("Could not log out: {error}");
            (
                StatusCode::BAD_GATEWAY,
                Alert::error("Log out failed", &error.user_message()).into_html(),
            )
                .into_response()
        }
        Err(error) => {
            tracing::warn!("Could not reach the budget API to log out, going to log in anyway: {error}");
            navigate_to(is_htmx, endpoints::LOG_IN_VIEW)
        }
    }
}

#[cfg(test)]
mod log_out_tests {
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header::SET_COOKIE},
        routing::get,
    };
    use axum_extra::extract::cookie::Cookie;
    use axum_htmx::HxRequest;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{
        api::SessionCookies,
        auth::AuthState,
        endpoints,
        test_utils::{
            StubBackend, assert_hx_redirect, assert_redirect, element_texts, parse_html_fragment,
        },
    };

    use super::get_log_out;

    fn log_out_backend(body: Value) -> Router {
        Router::new().route(
            endpoints::backend::LOG_OUT,
            get(move || async move {
                let mut headers = HeaderMap::new();
                headers.insert(SET_COOKIE, "session=; Max-Age=0; Path=/".parse().unwrap());
                (headers, Json(body))
            }),
        )
    }

    #[tokio::test]
    async fn log_out_follows_server_redirect_and_expires_cookie() {
        let backend = StubBackend::start(log_out_backend(
            json!({"message": "Logged out successfully", "redirect": "/login"}),
        ))
        .await;

        let response = get_log_out(
            State(AuthState {
                api: backend.client(),
            }),
            SessionCookies::new("session=abc"),
            HxRequest(true),
        )
        .await;

        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let cookie = Cookie::parse(set_cookie).unwrap();
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            backend.requests()[0].cookie.as_deref(),
            Some("session=abc")
        );
    }

    #[tokio::test]
    async fn external_redirect_is_replaced_with_log_in() {
        let backend =
            StubBackend::start(log_out_backend(json!({"redirect": "https://evil.example.com"})))
                .await;

        let response = get_log_out(
            State(AuthState {
                api: backend.client(),
            }),
            SessionCookies::default(),
            HxRequest(true),
        )
        .await;

        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn full_page_log_out_uses_see_other() {
        let backend = StubBackend::start(log_out_backend(json!({}))).await;

        let response = get_log_out(
            State(AuthState {
                api: backend.client(),
            }),
            SessionCookies::default(),
            HxRequest(false),
        )
        .await;

        assert_redirect(&response, endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn server_failure_shows_alert() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::LOG_OUT,
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;

        let response = get_log_out(
            State(AuthState {
                api: backend.client(),
            }),
            SessionCookies::default(),
            HxRequest(true),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().get("hx-redirect").is_none());
        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, "[role=alert] p"),
            ["Log out failed", "Request failed with status 500"]
        );
    }

    #[tokio::test]
    async fn unreachable_backend_still_goes_to_log_in() {
        let response = get_log_out(
            State(AuthState {
                api: StubBackend::unreachable_client().await,
            }),
            SessionCookies::default(),
            HxRequest(true),
        )
        .await;

        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
    }
}
