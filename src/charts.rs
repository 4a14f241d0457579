//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations from the budget API's statistics:
//! - **Spending by category**: bar chart of the total spent per category
//! - **Spending by month**: line chart of the total spent per month
//!
//! Each chart panel is reloaded with htmx. A reload must not leak the chart it
//! replaces, so every panel is rendered through a [ChartPanel] which emits the
//! script that disposes of the panel's previous ECharts instance (and its
//! resize listener) before initialising the new one.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, bar},
};
use maud::{Markup, PreEscaped, html};
use serde::Deserialize;

use crate::{
    AppState,
    api::{ApiClient, ApiError, SessionCookies},
    auth::LogInRedirect,
    endpoints,
};

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryStat {
    /// The category name, `None` for uncategorized transactions.
    #[serde(default)]
    pub category: Option<String>,
    /// The total spent.
    pub total_spent: f64,
}

/// The total spent in one month.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthlyStat {
    /// The month, e.g. "2024-05".
    pub month: String,
    /// The total spent.
    pub total_spent: f64,
}

/// The handle for one chart panel on the dashboard.
///
/// The browser keeps at most one ECharts instance per panel in
/// `window.budgetCharts`, keyed by the panel's element ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChartPanel {
    /// The HTML element ID of the chart container (kebab-case).
    pub id: &'static str,
}

pub(crate) const CATEGORY_CHART: ChartPanel = ChartPanel {
    id: "category-chart",
};
pub(crate) const MONTHLY_CHART: ChartPanel = ChartPanel { id: "monthly-chart" };

impl ChartPanel {
    /// JavaScript that disposes of this panel's chart, if there is one.
    fn teardown_script(&self) -> String {
        format!(
            r#"(function() {{
                const charts = window.budgetCharts = window.budgetCharts || {{}};
                const previous = charts["{id}"];
                if (previous) {{
                    window.removeEventListener('resize', previous.resize);
                    previous.darkMode.removeEventListener('change', previous.updateTheme);
                    previous.chart.dispose();
                    delete charts["{id}"];
                }}
            }})();"#,
            id = self.id
        )
    }

    /// JavaScript that replaces this panel's chart with one configured by `options`.
    fn init_script(&self, options: &str) -> String {
        format!(
            r#"{teardown}
            (function() {{
                const chartDom = document.getElementById("{id}");
                if (!chartDom) {{
                    return;
                }}
                const chart = echarts.init(chartDom);
                chart.setOption({options});

                const resize = () => chart.resize();
                window.addEventListener('resize', resize);

                const darkMode = window.matchMedia('(prefers-color-scheme: dark)');
                const updateTheme = () => {{
                    chart.setTheme(darkMode.matches ? 'dark' : 'default');
                }};
                darkMode.addEventListener('change', updateTheme);
                updateTheme();

                window.budgetCharts["{id}"] = {{ chart, resize, darkMode, updateTheme }};
            }})();"#,
            teardown = self.teardown_script(),
            id = self.id,
        )
    }

    /// Render the chart container and the script that draws `chart` in it.
    pub(crate) fn render(&self, chart: &Chart) -> Markup {
        // Chart labels come from user data, keep the HTML parser from seeing any tag in them.
        let options = chart.to_string().replace('<', "\\u003c");

        html! {
            div id=(self.id) class="min-h-[380px] w-full rounded dark:bg-gray-100" {}
            script { (PreEscaped(self.init_script(&options))) }
        }
    }

    /// Render `message` in place of the chart and dispose of the previous chart.
    pub(crate) fn render_message(&self, class: &str, message: &str) -> Markup {
        html! {
            div class=(class) { p { (message) } }
            script { (PreEscaped(self.teardown_script())) }
        }
    }
}

/// The state needed to render the chart panels.
#[derive(Debug, Clone)]
pub struct ChartState {
    /// The client for the budget API.
    pub api: ApiClient,
    /// The label appended to amounts.
    pub currency: String,
}

impl FromRef<AppState> for ChartState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            currency: state.currency.clone(),
        }
    }
}

/// Render the spending by category chart.
pub async fn get_category_chart(
    State(state): State<ChartState>,
    session: SessionCookies,
    log_in_redirect: LogInRedirect,
) -> Response {
    match state
        .api
        .get::<Vec<CategoryStat>>(endpoints::backend::CATEGORY_STATS, &session)
        .await
    {
        Ok(response) if response.body.is_empty() => {
            no_data_view(CATEGORY_CHART).into_response()
        }
        Ok(response) => CATEGORY_CHART
            .render(&category_chart(&response.body, &state.currency))
            .into_response(),
        Err(ApiError::AuthenticationRequired) => log_in_redirect.into_response(),
        Err(error) => chart_error_view(CATEGORY_CHART, &error).into_response(),
    }
}

/// Render the spending by month chart.
pub async fn get_monthly_chart(
    State(state): State<ChartState>,
    session: SessionCookies,
    log_in_redirect: LogInRedirect,
) -> Response {
    match state
        .api
        .get::<Vec<MonthlyStat>>(endpoints::backend::MONTHLY_STATS, &session)
        .await
    {
        Ok(response) if response.body.is_empty() => no_data_view(MONTHLY_CHART).into_response(),
        Ok(response) => MONTHLY_CHART
            .render(&monthly_chart(&response.body, &state.currency))
            .into_response(),
        Err(ApiError::AuthenticationRequired) => log_in_redirect.into_response(),
        Err(error) => chart_error_view(MONTHLY_CHART, &error).into_response(),
    }
}

fn no_data_view(panel: ChartPanel) -> Markup {
    panel.render_message(
        "empty-state text-gray-500 dark:text-gray-400",
        "No spending data yet.",
    )
}

fn chart_error_view(panel: ChartPanel, error: &ApiError) -> Markup {
    panel.render_message(
        "error-state text-red-600 dark:text-red-400",
        &format!("Error loading chart. {}", error.user_message()),
    )
}

pub(crate) fn category_chart(stats: &[CategoryStat], currency: &str) -> Chart {
    let labels: Vec<String> = stats
        .iter()
        .map(|stat| {
            stat.category
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_owned())
        })
        .collect();
    let values: Vec<f64> = stats.iter().map(|stat| stat.total_spent).collect();

    Chart::new()
        .title(Title::new().text("Spending by category"))
        .tooltip(currency_tooltip(currency))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .series(bar::Bar::new().name("Spent").data(values))
}

/// Months are plotted in chronological order whatever order the API sent them in.
pub(crate) fn monthly_chart(stats: &[MonthlyStat], currency: &str) -> Chart {
    let mut stats: Vec<&MonthlyStat> = stats.iter().collect();
    stats.sort_by(|a, b| a.month.cmp(&b.month));

    let labels: Vec<String> = stats.iter().map(|stat| stat.month.clone()).collect();
    let values: Vec<f64> = stats.iter().map(|stat| stat.total_spent).collect();

    Chart::new()
        .title(Title::new().text("Spending by month"))
        .tooltip(currency_tooltip(currency))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .series(Line::new().name("Spent").data(values))
}

fn currency_formatter(currency: &str) -> JsFunction {
    // A JSON string is also a valid JavaScript string literal.
    let currency = serde_json::Value::from(currency).to_string();

    JsFunction::new_with_args(
        "number",
        &format!(
            "return (number == null) ? \"-\" : number.toFixed(2) + \" \" + {currency};"
        ),
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip(currency: &str) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
    use maud::html;
    use serde_json::json;

    use crate::{
        api::SessionCookies,
        auth::LogInRedirect,
        endpoints,
        test_utils::{
            StubBackend, assert_hx_redirect, element_texts, parse_html_fragment, response_text,
        },
    };

    use super::{
        CATEGORY_CHART, CategoryStat, ChartState, MONTHLY_CHART, MonthlyStat, category_chart,
        get_category_chart, get_monthly_chart, monthly_chart,
    };

    fn stats_backend() -> Router {
        Router::new()
            .route(
                endpoints::backend::CATEGORY_STATS,
                get(|| async {
                    Json(json!([
                        {"category": "Food", "total_spent": 120.5},
                        {"category": null, "total_spent": 10}
                    ]))
                }),
            )
            .route(
                endpoints::backend::MONTHLY_STATS,
                get(|| async {
                    Json(json!([
                        {"month": "2024-05", "total_spent": 300},
                        {"month": "2024-04", "total_spent": 250}
                    ]))
                }),
            )
    }

    fn chart_state(backend: &StubBackend) -> ChartState {
        ChartState {
            api: backend.client(),
            currency: "BGN".to_owned(),
        }
    }

    #[test]
    fn category_chart_labels_uncategorized_spending() {
        let stats = [
            CategoryStat {
                category: Some("Food".to_owned()),
                total_spent: 120.5,
            },
            CategoryStat {
                category: None,
                total_spent: 10.0,
            },
        ];

        let options = category_chart(&stats, "BGN").to_string();

        assert!(options.contains("\"Food\""));
        assert!(options.contains("\"Uncategorized\""));
        assert!(options.contains("\"bar\""));
        assert!(options.contains("Spending by category"));
    }

    #[test]
    fn monthly_chart_is_chronological() {
        let stats = [
            MonthlyStat {
                month: "2024-05".to_owned(),
                total_spent: 300.0,
            },
            MonthlyStat {
                month: "2024-04".to_owned(),
                total_spent: 250.0,
            },
        ];

        let options = monthly_chart(&stats, "BGN").to_string();

        let april = options.find("2024-04").expect("missing April");
        let may = options.find("2024-05").expect("missing May");
        assert!(april < may, "months should be in chronological order");
        assert!(options.contains("\"line\""));
    }

    #[tokio::test]
    async fn chart_fragment_disposes_previous_chart_before_init() {
        let backend = StubBackend::start(stats_backend()).await;

        let response = get_category_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = response_text(response).await;
        assert!(text.contains(&format!("id=\"{}\"", CATEGORY_CHART.id)));
        let dispose = text.find("previous.chart.dispose()").expect("missing teardown");
        let init = text.find("echarts.init").expect("missing init");
        assert!(dispose < init, "previous chart must be disposed before init");
    }

    #[tokio::test]
    async fn monthly_chart_fragment_has_container() {
        let backend = StubBackend::start(stats_backend()).await;

        let response = get_monthly_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        let html = parse_html_fragment(response).await;
        let selector = scraper::Selector::parse(&format!("div#{}", MONTHLY_CHART.id)).unwrap();
        assert_eq!(html.select(&selector).count(), 1);
    }

    #[tokio::test]
    async fn empty_stats_show_message_and_tear_down() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::MONTHLY_STATS,
            get(|| async { Json(json!([])) }),
        ))
        .await;

        let response = get_monthly_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        let text = response_text(response).await;
        assert!(text.contains("previous.chart.dispose()"));
        assert!(!text.contains("echarts.init"));
        let html = scraper::Html::parse_fragment(&text);
        assert_eq!(element_texts(&html, ".empty-state p"), ["No spending data yet."]);
    }

    #[test]
    fn chart_labels_cannot_open_or_close_tags() {
        for label in ["</script><b>x</b>", "<!--<script>"] {
            let chart = category_chart(
                &[CategoryStat {
                    category: Some(label.to_owned()),
                    total_spent: 1.0,
                }],
                "BGN",
            );

            let markup = html! {
                (CATEGORY_CHART.render(&chart))
                p id="after" { "after" }
            }
            .into_string();

            assert_eq!(markup.matches("</script>").count(), 1, "label {label:?}");
            assert!(markup.contains("\\u003c"), "label {label:?} was not escaped");
            let html = scraper::Html::parse_fragment(&markup);
            assert_eq!(
                element_texts(&html, "p#after"),
                ["after"],
                "label {label:?} swallowed the rest of the fragment"
            );
        }
    }

    #[tokio::test]
    async fn unauthorized_category_chart_redirects_to_log_in() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::CATEGORY_STATS,
            get(|| async { StatusCode::UNAUTHORIZED }),
        ))
        .await;

        let response = get_category_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
        assert_eq!(response_text(response).await, "");
    }

    #[tokio::test]
    async fn unauthorized_monthly_chart_redirects_to_log_in() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::MONTHLY_STATS,
            get(|| async { StatusCode::UNAUTHORIZED }),
        ))
        .await;

        let response = get_monthly_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(Some("/dashboard".to_owned())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_hx_redirect(&response, "/login?redirect_url=%2Fdashboard");
        assert_eq!(response_text(response).await, "");
    }

    #[tokio::test]
    async fn server_error_is_shown_inline() {
        let backend = StubBackend::start(Router::new().route(
            endpoints::backend::CATEGORY_STATS,
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "stats unavailable"})),
                )
            }),
        ))
        .await;

        let response = get_category_chart(
            State(chart_state(&backend)),
            SessionCookies::default(),
            LogInRedirect::for_htmx(None),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, ".error-state p"),
            ["Error loading chart. stats unavailable"]
        );
    }
}
