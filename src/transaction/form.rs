use maud::{Markup, html};
use time::Date;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
};

/// The form for adding a transaction, with the date set to `today`.
///
/// Set `swap_oob` to replace the form on the page from a response to a
/// successful submission, which clears the fields the user typed in.
pub(crate) fn transaction_form(today: Date, swap_oob: bool) -> Markup {
    html! {
        form
            id="transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="#prediction"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            hx-swap-oob=[swap_oob.then_some("true")]
            class="w-full space-y-4"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    div class="flex items-center gap-3"
                    {
                        input
                            name="type"
                            id="transaction-type-expense"
                            type="radio"
                            value="expense"
                            checked
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="transaction-type-expense" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Expense"
                        }
                    }

                    div class="flex items-center gap-3"
                    {
                        input
                            name="type"
                            id="transaction-type-income"
                            type="radio"
                            value="income"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="transaction-type-income" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Income"
                        }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Description"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Add transaction"
            }
        }
    }
}
