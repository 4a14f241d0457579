//! The forecast panel: expected income, spending and savings with the
//! transactions the budget API expects to recur.
//!
//! The budget API has answered with two shapes over time:
//! - `{total_income, total_spending, net_savings, forecast: [...]}`
//! - `{predicted_income, predicted_spending, spending_by_category: {...}, message, period}`
//!
//! Both are read into a single [Forecast].

use std::collections::HashMap;

use axum::{
    extract::{FromRef, State},
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
    transaction::TransactionType,
};

/// A transaction the budget API expects to happen again.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastItem {
    /// The next expected date as sent by the API.
    #[serde(default)]
    pub date: Option<String>,
    /// What the money is for.
    #[serde(default)]
    pub description: String,
    /// The amount of a single occurrence.
    #[serde(default)]
    pub amount: f64,
    /// Whether the money comes in or goes out.
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    /// How many times the transaction is expected in the forecast period.
    #[serde(default)]
    pub expected_occurrences: Option<f64>,
    /// The amount over all expected occurrences.
    #[serde(default)]
    pub total_estimate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    #[serde(alias = "predicted_income", default)]
    total_income: f64,
    #[serde(alias = "predicted_spending", default)]
    total_spending: f64,
    #[serde(default)]
    net_savings: Option<f64>,
    #[serde(default)]
    forecast: Vec<ForecastItem>,
    #[serde(default)]
    spending_by_category: HashMap<String, f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    period: Option<String>,
}

/// A forecast from the budget API in either of its shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ForecastPayload")]
pub struct Forecast {
    /// Expected income over the forecast period.
    pub total_income: f64,
    /// Expected spending over the forecast period.
    pub total_spending: f64,
    /// Income minus spending, unless the API says otherwise.
    pub net_savings: f64,
    /// The expected transactions, in the order the API sent them.
    pub items: Vec<ForecastItem>,
    /// Expected spending per category, largest first.
    pub spending_by_category: Vec<(String, f64)>,
    /// A description of the forecast period, e.g. "Next 30 days".
    pub subtitle: Option<String>,
}

impl From<ForecastPayload> for Forecast {
    fn from(payload: ForecastPayload) -> Self {
        let mut spending_by_category: Vec<(String, f64)> =
            payload.spending_by_category.into_iter().collect();
        spending_by_category.sort_by(|(name_a, amount_a), (name_b, amount_b)| {
            amount_b.total_cmp(amount_a).then_with(|| name_a.cmp(name_b))
        });

        Self {
            total_income: payload.total_income,
            total_spending: payload.total_spending,
            net_savings: payload
                .net_savings
                .unwrap_or(payload.total_income - payload.total_spending),
            items: payload.forecast,
            spending_by_category,
            subtitle: payload.message.or(payload.period),
        }
    }
}

/// The state needed to render the forecast panel.
#[derive(Debug, Clone)]
pub struct ForecastState {
    /// The client for the budget API.
    pub api: ApiClient,
    /// The label appended to amounts.
    pub currency: String,
}

impl FromRef<AppState> for ForecastState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            currency: state.currency.clone(),
        }
    }
}

/// Render the forecast panel fragment.
pub async fn get_forecast(
    State(state): State<ForecastState>,
    session: SessionCookies,
    log_in_redirect: LogInRedirect,
) -> Response {
    match state
        .api
        .get::<Forecast>(endpoints::backend::PREDICT, &session)
        .await
    {
        Ok(response) => forecast_view(&response.body, &state.currency).into_response(),
        Err(ApiError::AuthenticationRequired) => log_in_redirect.into_response(),
        Err(error) => html! {
            div class="error-state text-red-600 dark:text-red-400"
            {
                p { "Error loading forecast. " (error.user_message()) }
            }
        }
        .into_response(),
    }
}

fn forecast_view(forecast: &Forecast, currency: &str) -> Markup {
    let income: Vec<&ForecastItem> = forecast
        .items
        .iter()
        .filter(|item| item.kind == TransactionType::Income)
        .collect();
    let expenses: Vec<&ForecastItem> = forecast
        .items
        .iter()
        .filter(|item| item.kind == TransactionType::Expense)
        .collect();

    html! {
        div class="space-y-4"
        {
            div
            {
                h3 class="text-lg font-semibold" { "💰 Forecast" }

                @if let Some(subtitle) = &forecast.subtitle {
                    p class="subtitle text-sm text-gray-500 dark:text-gray-400" { (subtitle) }
                }
            }

            ul id="forecast-summary" class="space-y-1"
            {
                li { "Expected income: " b { (format_amount(forecast.total_income, currency)) } }
                li { "Expected spending: " b { (format_amount(forecast.total_spending, currency)) } }
                li { "Net savings: " b { (format_amount(forecast.net_savings, currency)) } }
            }

            // The older shape has no item list, only the category breakdown.
            @if forecast.items.is_empty() && forecast.spending_by_category.is_empty() {
                p class="empty-state text-gray-500 dark:text-gray-400" { "No predictable transactions" }
            } @else {
                (forecast_group("Income", &income, currency))
                (forecast_group("Expenses", &expenses, currency))
            }

            @if !forecast.spending_by_category.is_empty() {
                div
                {
                    h4 class="font-semibold" { "Spending by category" }

                    ul id="spending-by-category"
                    {
                        @for (category, amount) in &forecast.spending_by_category {
                            li { (category) ": " (format_amount(*amount, currency)) }
                        }
                    }
                }
            }
        }
    }
}

fn forecast_group(title: &str, items: &[&ForecastItem], currency: &str) -> Markup {
    if items.is_empty() {
        return html! {};
    }

    html! {
        div class="forecast-group"
        {
            h4 class="font-semibold" { (title) }

            ul class="divide-y divide-gray-200 dark:divide-gray-700"
            {
                @for item in items {
                    li class="forecast-item py-1"
                    {
                        @if let Some(date) = &item.date {
                            (date) " — "
                        }
                        (item.description) " — "
                        (format_amount(item.amount, currency))
                        " (" (item.kind) ")"

                        @if let Some(occurrences) = item.expected_occurrences {
                            " ×" (occurrences)
                        }
                        @if let Some(total) = item.total_estimate {
                            ", total " (format_amount(total, currency))
                        }
                    }
                }
            }
        }
    }
}
