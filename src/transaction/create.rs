//! Defines the endpoint for submitting a new transaction.

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxResponseTrigger;
use maud::html;

use crate::{
    AppState, Error,
    api::{ApiClient, ApiError, SessionCookies},
    auth::LogInRedirect,
    endpoints,
    timezone::local_today,
    transaction::{
        CreatedTransaction, TRANSACTIONS_CHANGED_EVENT, TransactionForm, transaction_form,
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The client for the budget API.
    pub api: ApiClient,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Sofia".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for submitting the transaction form.
///
/// An invalid form is answered with an alert and never reaches the budget API.
/// On success the predicted category is shown, the form is reset and the
/// transaction list and charts are told to reload.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    session: SessionCookies,
    log_in_redirect: LogInRedirect,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match form.validate() {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::debug!("Rejected transaction form {form:?}: {error}");
            return Error::from(error).into_alert_response();
        }
    };

    let created = match state
        .api
        .post_json::<CreatedTransaction, _>(
            endpoints::backend::TRANSACTIONS,
            &new_transaction,
            &session,
        )
        .await
    {
        Ok(response) => response.body,
        Err(ApiError::AuthenticationRequired) => return log_in_redirect.into_response(),
        Err(error) => {
            tracing::error!("Could not create transaction {new_transaction:?}: {error}");
            return html! {
                p class="text-red-600 dark:text-red-400"
                {
                    "Error adding transaction. " (error.user_message())
                }
            }
            .into_response();
        }
    };

    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let category = created.category.as_deref().unwrap_or("Uncategorized");

    (
        HxResponseTrigger::normal([TRANSACTIONS_CHANGED_EVENT]),
        html! {
            p class="font-medium" { "Predicted category: " (category) }

            (transaction_form(today, true))
        },
    )
        .into_response()
}
