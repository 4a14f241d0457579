//! Application router configuration.
//!
//! Pages are served under plain paths and the fragments that htmx loads
//! into them are served under `/api`. Authentication is enforced by the
//! budget API, so there is no auth layer here: every handler that calls the
//! API turns a 401 into a redirect to the log in page.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{get_log_in_page, get_log_out, get_register_page, post_log_in, post_register},
    charts::{get_category_chart, get_monthly_chart},
    dashboard::get_dashboard_page,
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    forecast::get_forecast,
    transaction::{create_transaction_endpoint, get_transaction_list},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let fragment_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transaction_list).post(create_transaction_endpoint),
        )
        .route(endpoints::FORECAST_API, get(get_forecast))
        .route(endpoints::CATEGORY_CHART_API, get(get_category_chart))
        .route(endpoints::MONTHLY_CHART_API, get(get_monthly_chart))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::REGISTER_API, post(post_register))
        .route(endpoints::LOG_OUT, get(get_log_out));

    page_routes
        .merge(fragment_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
