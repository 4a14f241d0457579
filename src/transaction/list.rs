//! The transaction list panel of the dashboard.

use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState,
    api::{ApiClient, ApiError, SessionCookies},
    auth::LogInRedirect,
    endpoints,
    html::format_amount,
    transaction::{Transaction, TransactionType},
};

/// The header the budget API uses to describe the logged in user.
const USER_INFO_HEADER: &str = "x-user-info";

/// The state needed to render the transaction list.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The client for the budget API.
    pub api: ApiClient,
    /// The label appended to amounts.
    pub currency: String,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            currency: state.currency.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    username: String,
}

/// Read the username from the `X-User-Info` header, e.g. `{"username": "ana", "id": 1}`.
fn username_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(USER_INFO_HEADER)?.to_str().ok()?;

    match serde_json::from_str::<UserInfo>(raw) {
        Ok(user) => Some(user.username),
        Err(error) => {
            tracing::warn!("Ignoring malformed {USER_INFO_HEADER} header {raw:?}: {error}");
            None
        }
    }
}

/// Render the transaction list fragment.
///
/// Every call replaces the whole panel, so the fragment only depends on the
/// latest response from the budget API.
pub async fn get_transaction_list(
    State(state): State<TransactionListState>,
    session: SessionCookies,
    log_in_redirect: LogInRedirect,
) -> Response {
    match state
        .api
        .get::<Vec<Transaction>>(endpoints::backend::TRANSACTIONS, &session)
        .await
    {
        Ok(response) => {
            let username = username_from_headers(&response.headers);

            html! {
                (transaction_list_view(&response.body, &state.currency))

                @if let Some(username) = username {
                    (current_user_oob(&username))
                }
            }
            .into_response()
        }
        Err(ApiError::AuthenticationRequired) => log_in_redirect.into_response(),
        Err(error) => transaction_list_error_view(&error).into_response(),
    }
}

/// Sort newest first, transactions on the same day keep the order the API sent them in.
fn newest_first(transactions: &[Transaction]) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

pub(crate) fn transaction_list_view(transactions: &[Transaction], currency: &str) -> Markup {
    if transactions.is_empty() {
        return html! {
            div class="empty-state text-gray-500 dark:text-gray-400"
            {
                p { "No transactions found. Add your first transaction!" }
            }
        };
    }

    html! {
        ul id="transactions" class="divide-y divide-gray-200 dark:divide-gray-700"
        {
            @for transaction in newest_first(transactions) {
                (transaction_row(transaction, currency))
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, currency: &str) -> Markup {
    let amount_style = match transaction.kind {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
    };

    html! {
        li class={ "transaction py-2 " (transaction.kind) }
        {
            span class="date" { (transaction.date) }
            " — "
            span class="description font-medium" { (transaction.description) }
            " — "
            span class={ "amount " (amount_style) } { (format_amount(transaction.amount, currency)) }
            " ["
            span class="category" {
                (transaction.category.as_deref().unwrap_or("Uncategorized"))
            }
            "] ("
            span class="type" { (transaction.kind) }
            ")"
        }
    }
}

fn transaction_list_error_view(error: &ApiError) -> Markup {
    html! {
        div class="error-state text-red-600 dark:text-red-400"
        {
            p { "Error loading transactions. " (error.user_message()) }
        }
    }
}

/// Replace the greeting in the page header.
fn current_user_oob(username: &str) -> Markup {
    html! {
        span id="current-user" hx-swap-oob="true" { "BudgetHelper - " (username) }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        api::SessionCookies,
        auth::LogInRedirect,
        endpoints,
        test_utils::{
            StubBackend, assert_hx_redirect, assert_valid_html, element_texts,
            parse_html_fragment, response_text,
        },
        transaction::{Transaction, TransactionType},
    };

    use super::{TransactionListState, get_transaction_list, transaction_list_view};

    fn backend_with_transactions(transactions: Value) -> Router {
        Router::new().route(
            endpoints::backend::TRANSACTIONS,
            get(move || async move { Json(transactions) }),
        )
    }

    fn list_state(backend: &StubBackend) -> TransactionListState {
        TransactionListState {
            api: backend.client(),
            currency: "BGN".to_owned(),
        }
    }

    fn groceries() -> Value {
        json!({
            "id": 1,
            "amount": 42.5,
            "description": "Groceries",
            "date": "2024-05-01",
            "type": "expense",
            "category": "Food"
        })
    }

    #[tokio::test]
    async fn renders_transaction_row() {
        let backend = StubBackend::start(backend_with_transactions(json!([groceries()]))).await;

        let response = get_transaction_list(
            State(list_state(&backend)),
            SessionCookies::new("session=abc"),
            LogInRedirect::for_htmx(None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            element_texts(&html, "li.transaction"),
            ["2024-05-01 — Groceries — 42.50 BGN [Food] (expense)"]
        );
        assert_eq!(
            backend.requests()[0].cookie.as_deref(),
            Some("session=abc")
        );
    }

    #[tokio::test]
    async fn empty_collection_shows_empty_state() {
        let backend = StubBackend::start(backend_with_transactions(json!([]))).await;

        let response = get_transaction_list(
            State(list_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, ".empty-state p"),
            ["No transactions found. Add your first transaction!"]
        );
        assert!(element_texts(&html, "li").is_empty());
    }

    #[tokio::test]
    async fn unauthorized_redirects_to_log_in_without_content() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::TRANSACTIONS,
            get(|| async { StatusCode::UNAUTHORIZED }),
        ))
        .await;

        let response = get_transaction_list(
            State(list_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(Some(endpoints::DASHBOARD_VIEW.to_owned())),
        )
        .await;

        assert_hx_redirect(&response, "/login?redirect_url=%2Fdashboard");
        assert_eq!(response_text(response).await, "");
    }

    #[tokio::test]
    async fn server_error_is_shown_inline() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::TRANSACTIONS,
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "database is locked"})),
                )
            }),
        ))
        .await;

        let response = get_transaction_list(
            State(list_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, ".error-state p"),
            ["Error loading transactions. database is locked"]
        );
    }

    #[tokio::test]
    async fn updates_greeting_from_user_info_header() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::TRANSACTIONS,
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(
                    "X-User-Info",
                    r#"{"username": "ana", "id": 1}"#.parse().unwrap(),
                );
                (headers, Json(json!([])))
            }),
        ))
        .await;

        let response = get_transaction_list(
            State(list_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, "span#current-user[hx-swap-oob]"),
            ["BudgetHelper - ana"]
        );
    }

    #[test]
    fn newest_transaction_is_listed_first() {
        let transaction = |description: &str, date| Transaction {
            amount: 1.0,
            description: description.to_owned(),
            date,
            kind: TransactionType::Income,
            category: None,
        };
        let transactions = [
            transaction("old", date!(2024 - 01 - 01)),
            transaction("new", date!(2024 - 03 - 01)),
            transaction("same day, first", date!(2024 - 02 - 01)),
            transaction("same day, second", date!(2024 - 02 - 01)),
        ];

        let html = scraper::Html::parse_fragment(
            &transaction_list_view(&transactions, "BGN").into_string(),
        );

        assert_eq!(
            element_texts(&html, "li .description"),
            ["new", "same day, first", "same day, second", "old"]
        );
        assert_eq!(
            element_texts(&html, "li .category"),
            ["Uncategorized"; 4]
        );
    }

    #[test]
    fn rendering_twice_is_identical() {
        let transactions: Vec<Transaction> =
            serde_json::from_value(json!([groceries(), groceries()])).unwrap();

        assert_eq!(
            transaction_list_view(&transactions, "BGN").into_string(),
            transaction_list_view(&transactions, "BGN").into_string()
        );
    }
}
