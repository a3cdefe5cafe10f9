//! Transfer drafts (UI-owned input) and materialized transfer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Address, LedgerUnits};

/// A form field of [`TransactionDraft`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftField {
    Recipient,
    Amount,
    Keyword,
    Message,
}

impl FromStr for DraftField {
    type Err = String;

    /// Accepts the form input names (`addressTo`, `amount`, `keyword`, `message`)
    /// as well as `recipient`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addressTo" | "recipient" => Ok(Self::Recipient),
            "amount" => Ok(Self::Amount),
            "keyword" => Ok(Self::Keyword),
            "message" => Ok(Self::Message),
            other => Err(format!("unknown draft field: {other}")),
        }
    }
}

/// A transfer being composed by the user.
///
/// Fields are raw user input; validation happens at submission time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub recipient: String,
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

impl TransactionDraft {
    pub fn new(
        recipient: impl Into<String>,
        amount: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    /// Replace a single field, leaving the others untouched.
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Recipient => self.recipient = value,
            DraftField::Amount => self.amount = value,
            DraftField::Keyword => self.keyword = value,
            DraftField::Message => self.message = value,
        }
    }
}

/// A transfer as recorded on the ledger, normalized for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub sender: Address,
    pub receiver: Address,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub keyword: String,
    pub amount: LedgerUnits,
}

impl TransactionRecord {
    /// Human-readable timestamp, e.g. `2023-11-14 22:13:20 UTC`.
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}
