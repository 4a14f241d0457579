use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::date::{api_date, parse_iso_date};

/// Whether money came in or went out.
///
/// Written as "income" or "expense" on the wire. Older versions of the
/// budget API call expenses "spending", which is accepted when reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    #[default]
    #[serde(alias = "spending")]
    Expense,
}

impl TransactionType {
    /// The wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction stored by the budget API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    /// The amount of money, as stored.
    pub amount: f64,
    /// What the money was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "api_date")]
    pub date: Date,
    /// Whether the money came in or went out.
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    /// The category assigned by the budget API, if any.
    #[serde(default)]
    pub category: Option<String>,
}

/// The body of a request to create a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    /// A finite amount of money.
    pub amount: f64,
    /// A non-empty description without surrounding whitespace.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "api_date")]
    pub date: Date,
    /// Whether the money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// The part of the budget API's answer to a new transaction that is shown to the user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedTransaction {
    /// The category predicted for the new transaction.
    #[serde(default)]
    pub category: Option<String>,
}

/// The reasons a submitted transaction form is rejected.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// The description is empty or only whitespace.
    #[error("description must not be empty")]
    EmptyDescription,

    /// The amount is not a finite number.
    #[error("amount \"{0}\" is not a number")]
    InvalidAmount(String),

    /// No date was given.
    #[error("date must not be empty")]
    MissingDate,

    /// The date is not a calendar date in the format YYYY-MM-DD.
    #[error("date \"{0}\" is not a valid date, use the format YYYY-MM-DD")]
    InvalidDate(String),
}

/// The raw fields of the transaction form.
///
/// Every field is text so that invalid input reaches [TransactionForm::validate]
/// instead of being rejected by the form extractor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionForm {
    /// The amount as typed.
    #[serde(default)]
    pub amount: String,
    /// The description as typed.
    #[serde(default)]
    pub description: String,
    /// The date as sent by the date input.
    #[serde(default)]
    pub date: String,
    /// The selected transaction type.
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
}

impl TransactionForm {
    /// Check the form and convert it into the body for the budget API.
    ///
    /// # Errors
    /// Returns the first problem found, checking the description, the amount
    /// and then the date.
    pub fn validate(&self) -> Result<NewTransaction, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let amount = self.amount.trim();
        let amount = amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| ValidationError::InvalidAmount(amount.to_owned()))?;

        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let date =
            parse_iso_date(date).ok_or_else(|| ValidationError::InvalidDate(date.to_owned()))?;

        Ok(NewTransaction {
            amount,
            description: description.to_owned(),
            date,
            kind: self.kind,
        })
    }
}
