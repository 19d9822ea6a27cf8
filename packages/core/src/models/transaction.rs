//! Ledger transactions
//!
//! Amounts are stored as non-negative magnitudes; the sign comes from the
//! transaction kind. The `kind` field maps to the remote `type` column.

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// +1 for income, -1 for expenses
    pub fn sign(&self) -> f64 {
        match self {
            TransactionKind::Income => 1.0,
            TransactionKind::Expense => -1.0,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Work,
    Tech,
    Food,
    Shopping,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub label: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// `+amount` for income, `-amount` for expenses
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub label: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Category,
}

impl TransactionDraft {
    /// Build a draft from raw form input
    ///
    /// The amount accepts either `.` or `,` as decimal separator.
    ///
    /// # Errors
    ///
    /// - `MissingField` when the label or amount is blank
    /// - `InvalidAmount` when the amount is not a finite positive number
    pub fn parse(
        label: &str,
        amount: &str,
        kind: TransactionKind,
        category: Category,
    ) -> Result<Self, ValidationError> {
        require_text("label", label)?;
        require_text("amount", amount)?;

        let normalized = amount.trim().replace(',', ".");
        let value: f64 = normalized
            .parse()
            .map_err(|_| ValidationError::invalid_amount(format!("'{}' is not a number", amount)))?;

        let draft = Self {
            label: label.trim().to_string(),
            amount: value,
            kind,
            category,
        };
        Transaction::validate_draft(&draft)?;
        Ok(draft)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Record for Transaction {
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;

    const TABLE: &'static str = "transactions";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &TransactionDraft) -> Self {
        Self {
            id,
            label: draft.label.clone(),
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }

    fn validate_draft(draft: &TransactionDraft) -> Result<(), ValidationError> {
        require_text("label", &draft.label)?;
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(ValidationError::invalid_amount(format!(
                "amount must be a positive number, got {}",
                draft.amount
            )));
        }
        Ok(())
    }
}
