//! The URIs served to the browser and the paths consumed on the budget API.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The page with the transaction form, transaction list, charts and forecast.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for the transaction list fragment and for submitting transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for the forecast panel fragment.
pub const FORECAST_API: &str = "/api/forecast";
/// The route for the spending by category chart fragment.
pub const CATEGORY_CHART_API: &str = "/api/charts/category";
/// The route for the spending by month chart fragment.
pub const MONTHLY_CHART_API: &str = "/api/charts/monthly";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for registering a new user.
pub const REGISTER_API: &str = "/api/register";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";

/// Paths on the remote budget API.
pub mod backend {
    /// List (GET) or create (POST) transactions.
    pub const TRANSACTIONS: &str = "/transactions";
    /// Spending and income forecast.
    pub const PREDICT: &str = "/predict";
    /// Total spent per category.
    pub const CATEGORY_STATS: &str = "/api/stats/category";
    /// Total spent per month.
    pub const MONTHLY_STATS: &str = "/api/stats/monthly";
    /// Start a session.
    pub const LOG_IN: &str = "/login";
    /// Create a user and start a session.
    pub const REGISTER: &str = "/register";
    /// End the current session.
    pub const LOG_OUT: &str = "/logout";
}
