//! Alerts for displaying error messages to users.
//!
//! Alerts are returned by htmx endpoints with an error status and swapped
//! into the `#alert-container` element of the base layout.

use maud::{Markup, html};

/// An error message to show in the alert container.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// The headline.
    pub message: String,
    /// What went wrong and how to fix it, may be empty.
    pub details: String,
}

impl Alert {
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn into_html(self) -> Markup {
        html! {
            div
                role="alert"
                class="flex items-start p-4 mb-4 text-sm border rounded-lg text-red-800
                    border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400
                    dark:border-red-800"
            {
                div class="flex-1"
                {
                    p class="font-medium" { (self.message) }

                    @if !self.details.is_empty() {
                        p class="mt-1" { (self.details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-3 font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use crate::test_utils::element_texts;

    use super::Alert;

    #[test]
    fn alert_shows_message_and_details() {
        let html = Html::parse_fragment(
            &Alert::error("Log out failed", "Try again")
                .into_html()
                .into_string(),
        );

        assert_eq!(
            element_texts(&html, "[role=alert] p"),
            ["Log out failed", "Try again"]
        );
    }

    #[test]
    fn empty_details_are_omitted() {
        let html = Html::parse_fragment(&Alert::error("Saved", "").into_html().into_string());

        assert_eq!(element_texts(&html, "[role=alert] p"), ["Saved"]);
    }
}
