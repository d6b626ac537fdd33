use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;

/// Whether a loan is still open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Issued,
    Returned,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Issued => f.write_str("Issued"),
            TransactionStatus::Returned => f.write_str("Returned"),
        }
    }
}

/// One loan of a book to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub issue_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// Still issued (not yet returned)
    pub fn is_open(&self) -> bool {
        self.status == TransactionStatus::Issued
    }

    /// Open and past its due date as of `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date.is_some_and(|due| due < today)
    }

    /// Close the loan
    pub fn close(&mut self, return_date: NaiveDate) {
        self.return_date = Some(return_date);
        self.status = TransactionStatus::Returned;
    }
}

impl Record for Transaction {
    const STORE_KEY: &'static str = "library-transactions";

    fn id(&self) -> &str {
        &self.id
    }
}
