//! The dashboard page.
//!
//! The page itself is a shell: every panel loads its content with its own
//! htmx request, so a slow or failing panel never holds up the others.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, Error,
    charts::{CATEGORY_CHART, MONTHLY_CHART},
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::local_today,
    transaction::{TRANSACTIONS_CHANGED_EVENT, transaction_form},
};

const ECHARTS_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Sofia".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the page with the transaction form, the transaction list, the charts and the forecast.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    dashboard_view(today).into_response()
}

/// The `hx-trigger` for panels that show stored transactions.
fn refresh_trigger() -> String {
    format!("load, {TRANSACTIONS_CHANGED_EVENT} from:body")
}

fn panel_heading(title: &str) -> Markup {
    html! {
        h2 class="mb-4 text-xl font-bold text-gray-900 dark:text-white" { (title) }
    }
}

fn loading_text() -> Markup {
    html! {
        p class="text-gray-500 dark:text-gray-400" { "Loading..." }
    }
}

fn chart_panel(id: &str, url: &str) -> Markup {
    html! {
        div
            id=(format!("{id}-panel"))
            hx-get=(url)
            hx-trigger=(refresh_trigger())
            class="w-full"
        {
            (loading_text())
        }
    }
}

fn dashboard_view(today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="mb-6 text-3xl font-bold"
            {
                "💳 "
                span id="current-user" { "BudgetHelper" }
            }

            div class="grid w-full max-w-screen-xl gap-6 lg:grid-cols-2"
            {
                section class=(CARD_STYLE)
                {
                    (panel_heading("Add transaction"))
                    (transaction_form(today, false))
                    div id="prediction" class="mt-4" {}
                }

                section class=(CARD_STYLE)
                {
                    (panel_heading("Transactions"))
                    div
                        id="transaction-list"
                        hx-get=(endpoints::TRANSACTIONS_API)
                        hx-trigger=(refresh_trigger())
                    {
                        (loading_text())
                    }
                }

                section class=(CARD_STYLE)
                {
                    (chart_panel(CATEGORY_CHART.id, endpoints::CATEGORY_CHART_API))
                }

                section class=(CARD_STYLE)
                {
                    (chart_panel(MONTHLY_CHART.id, endpoints::MONTHLY_CHART_API))
                }

                section class={ (CARD_STYLE) " lg:col-span-2" }
                {
                    (panel_heading("Forecast"))
                    button
                        id="forecast-button"
                        type="button"
                        hx-get=(endpoints::FORECAST_API)
                        hx-target="#forecast"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Show forecast"
                    }
                    div id="forecast" class="mt-4" {}
                }
            }
        }
    };

    base("Dashboard", &[ECHARTS_URL], &content)
}
