//! Transactions: the model shared with the budget API, validation of the
//! transaction form, the transaction list fragment and the endpoint that
//! submits new transactions.

mod create;
mod form;
mod list;
mod model;

pub(crate) use create::create_transaction_endpoint;
pub(crate) use form::transaction_form;
pub(crate) use list::get_transaction_list;
pub(crate) use model::{
    CreatedTransaction, Transaction, TransactionForm, TransactionType, ValidationError,
};

/// The htmx event triggered after a transaction is added.
///
/// The transaction list and both charts reload when it fires.
pub(crate) const TRANSACTIONS_CHANGED_EVENT: &str = "transactions-changed";
