//! Dashboard counters and the joined loan listing

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Book, BookStatus, Member, Transaction, TransactionStatus};

/// Shown when a transaction references a deleted book
pub const UNKNOWN_BOOK: &str = "Unknown Book";

/// Shown when a transaction references a deleted member
pub const UNKNOWN_MEMBER: &str = "Unknown Member";

/// Headline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: usize,
    pub total_members: usize,
    pub books_issued: usize,
    pub books_available: usize,
    /// Open transactions due before today
    pub overdue: usize,
}

impl DashboardStats {
    pub fn compute(
        books: &[Book],
        members: &[Member],
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Self {
        let books_issued = books.iter().filter(|b| b.status == BookStatus::Issued).count();

        Self {
            total_books: books.len(),
            total_members: members.len(),
            books_issued,
            books_available: books.len() - books_issued,
            overdue: transactions.iter().filter(|t| t.is_overdue(today)).count(),
        }
    }
}

/// One transaction joined with its book and member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub transaction_id: String,
    pub book_id: String,
    pub book_title: String,
    pub member_id: String,
    pub member_name: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub status: TransactionStatus,
    pub overdue: bool,
}

/// Join transactions to their books and members, newest issue first
///
/// Ties keep storage order.
pub fn loan_history(
    books: &[Book],
    members: &[Member],
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<LoanView> {
    let titles: HashMap<&str, &str> = books.iter().map(|b| (b.id.as_str(), b.title.as_str())).collect();
    let names: HashMap<&str, &str> = members.iter().map(|m| (m.id.as_str(), m.name.as_str())).collect();

    let mut rows: Vec<LoanView> = transactions
        .iter()
        .map(|t| LoanView {
            transaction_id: t.id.clone(),
            book_id: t.book_id.clone(),
            book_title: titles.get(t.book_id.as_str()).unwrap_or(&UNKNOWN_BOOK).to_string(),
            member_id: t.member_id.clone(),
            member_name: names.get(t.member_id.as_str()).unwrap_or(&UNKNOWN_MEMBER).to_string(),
            issue_date: t.issue_date,
            due_date: t.due_date,
            return_date: t.return_date,
            status: t.status,
            overdue: t.is_overdue(today),
        })
        .collect();

    rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
    rows
}
