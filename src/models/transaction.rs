//! This file defines income/expense transactions and their validation rules.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, models::UserID};

/// A newtype wrapper for integer transaction IDs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionID(i64);

impl TransactionID {
    /// Create a transaction ID from an integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a transaction adds to or subtracts from the user's funds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::Validation(
                "the transaction type must be either income or expense".to_owned(),
            )),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// An income or expense recorded by a user.
///
/// A transaction always belongs to exactly one user, set at creation time
/// from the authenticated caller and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    id: TransactionID,
    user_id: UserID,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    amount: f64,
    category: String,
    description: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Transaction {
    /// Start building a new transaction, validating its fields.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    pub fn build(
        user_id: UserID,
        transaction_type: Option<&str>,
        amount: Option<f64>,
        category: Option<String>,
        description: Option<String>,
    ) -> Result<TransactionBuilder, Error> {
        TransactionBuilder::new(user_id, transaction_type, amount, category, description)
    }

    /// Create a transaction from its fields without validating them.
    ///
    /// This is intended for use by [stores](crate::stores) reconstructing a
    /// persisted transaction.
    pub fn new_unchecked(
        id: TransactionID,
        user_id: UserID,
        transaction_type: TransactionType,
        amount: f64,
        category: String,
        description: String,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            user_id,
            transaction_type,
            amount,
            category,
            description,
            created_at,
        }
    }

    /// The transaction's ID in the database.
    pub fn id(&self) -> TransactionID {
        self.id
    }

    /// The ID of the user that owns this transaction.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// Whether this transaction is an income or an expense.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The amount of money involved. Always greater than zero.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The free-form category the user filed this transaction under.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// An optional note. Empty string when the user did not provide one.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the transaction was recorded.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Apply a partial update and re-validate.
    ///
    /// Fields that are `None` retain their previous values. The owner and
    /// creation time never change.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing every violated field message if
    /// the merged transaction is invalid.
    pub fn merge(
        self,
        transaction_type: Option<&str>,
        amount: Option<f64>,
        category: Option<String>,
        description: Option<String>,
    ) -> Result<Self, Error> {
        let mut violations = Vec::new();

        let transaction_type = match transaction_type {
            Some(raw) => parse_transaction_type(raw, &mut violations)
                .unwrap_or(self.transaction_type),
            None => self.transaction_type,
        };
        let amount = amount.unwrap_or(self.amount);
        let category = category.unwrap_or(self.category);
        let description = description.unwrap_or(self.description);

        validate_amount(amount, &mut violations);
        validate_category(&category, &mut violations);

        if !violations.is_empty() {
            return Err(Error::Validation(violations.join(", ")));
        }

        Ok(Self {
            transaction_type,
            amount,
            category,
            description,
            ..self
        })
    }
}

/// The validated fields for a transaction that has not been persisted yet.
///
/// The function for finalizing the builder is
/// [TransactionStore::create](crate::stores::TransactionStore::create).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    pub(crate) user_id: UserID,
    pub(crate) transaction_type: TransactionType,
    pub(crate) amount: f64,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) created_at: OffsetDateTime,
}

impl TransactionBuilder {
    /// Validate the fields for a new transaction.
    ///
    /// `description` defaults to the empty string when omitted. The creation
    /// time is set to now.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing **every** violated field
    /// message, joined with ", ": a missing or invalid type, a missing or
    /// non-positive amount, and a missing or empty category are each
    /// reported.
    pub fn new(
        user_id: UserID,
        transaction_type: Option<&str>,
        amount: Option<f64>,
        category: Option<String>,
        description: Option<String>,
    ) -> Result<Self, Error> {
        let mut violations = Vec::new();

        let transaction_type = match transaction_type {
            Some(raw) => parse_transaction_type(raw, &mut violations),
            None => {
                violations.push("a transaction type is required".to_owned());
                None
            }
        };

        match amount {
            Some(amount) => validate_amount(amount, &mut violations),
            None => violations.push("an amount is required".to_owned()),
        }

        match &category {
            Some(category) => validate_category(category, &mut violations),
            None => violations.push("a category is required".to_owned()),
        }

        match (transaction_type, amount, category) {
            (Some(transaction_type), Some(amount), Some(category))
                if violations.is_empty() =>
            {
                Ok(Self {
                    user_id,
                    transaction_type,
                    amount,
                    category,
                    description: description.unwrap_or_default(),
                    created_at: OffsetDateTime::now_utc(),
                })
            }
            _ => Err(Error::Validation(violations.join(", "))),
        }
    }
}

fn parse_transaction_type(raw: &str, violations: &mut Vec<String>) -> Option<TransactionType> {
    match raw.parse() {
        Ok(transaction_type) => Some(transaction_type),
        Err(_) => {
            violations.push("the transaction type must be either income or expense".to_owned());
            None
        }
    }
}

fn validate_amount(amount: f64, violations: &mut Vec<String>) {
    if amount <= 0.0 {
        violations.push("the amount must be greater than zero".to_owned());
    }
}

fn validate_category(category: &str, violations: &mut Vec<String>) {
    if category.trim().is_empty() {
        violations.push("the category must not be empty".to_owned());
    }
}
