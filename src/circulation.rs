//! Circulation Module
//!
//! Issues and returns books, keeping each book's status in step with its
//! open transaction.
//!
//! ## Per-book state machine
//! ```text
//!              issue
//!   Available ───────▶ Issued
//!       ▲                 │
//!       └─────────────────┘
//!            return
//! ```
//!
//! ## Write order
//! - issue:  book store, then transaction store
//! - return: transaction store, then book store
//!
//! The two writes are independent; a crash between them leaves the stores
//! disagreeing, which [`CirculationManager::audit`] reports.

use std::collections::{BTreeSet, HashMap};

use chrono::{Days, NaiveDate};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::ids::IdGenerator;
use crate::model::{Book, BookStatus, Member, Transaction, TransactionStatus};
use crate::repository::Collection;
use crate::store::KvStore;

/// Input to [`CirculationManager::issue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub book_id: String,
    pub member_id: String,
    pub issue_date: NaiveDate,
    /// Recording an already-completed loan closes it immediately
    pub return_date: Option<NaiveDate>,
}

impl IssueRequest {
    pub fn new(book_id: impl Into<String>, member_id: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            book_id: book_id.into(),
            member_id: member_id.into(),
            issue_date,
            return_date: None,
        }
    }

    pub fn returned_on(mut self, date: NaiveDate) -> Self {
        self.return_date = Some(date);
        self
    }
}

/// Rules applied when issuing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CirculationPolicy {
    pub loan_period_days: u32,
    pub reject_double_issue: bool,
    pub verify_references: bool,
}

impl From<&Config> for CirculationPolicy {
    fn from(config: &Config) -> Self {
        Self {
            loan_period_days: config.loan_period_days,
            reject_double_issue: config.reject_double_issue,
            verify_references: config.verify_references,
        }
    }
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Disagreements between book statuses and open transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Books marked Issued with no open transaction
    pub issued_without_loan: Vec<String>,

    /// Books marked Available that have an open transaction
    pub available_with_loan: Vec<String>,

    /// Books with more than one open transaction
    pub multiple_open_loans: Vec<String>,

    /// Open transactions whose book no longer exists
    pub dangling_loans: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issued_without_loan.is_empty()
            && self.available_with_loan.is_empty()
            && self.multiple_open_loans.is_empty()
            && self.dangling_loans.is_empty()
    }
}

/// Coordinates the book and transaction collections
pub struct CirculationManager<'a> {
    store: &'a dyn KvStore,
    ids: &'a dyn IdGenerator,
    clock: &'a dyn Clock,
    policy: CirculationPolicy,
}

impl<'a> CirculationManager<'a> {
    pub fn new(
        store: &'a dyn KvStore,
        ids: &'a dyn IdGenerator,
        clock: &'a dyn Clock,
        policy: CirculationPolicy,
    ) -> Self {
        Self {
            store,
            ids,
            clock,
            policy,
        }
    }

    fn books(&self) -> Collection<'a, Book> {
        Collection::new(self.store)
    }

    fn members(&self) -> Collection<'a, Member> {
        Collection::new(self.store)
    }

    fn transactions(&self) -> Collection<'a, Transaction> {
        Collection::new(self.store)
    }

    /// Lend a book to a member
    ///
    /// Marks the book Issued (if it exists) and appends a new transaction.
    /// The transaction is created Returned when the request carries a
    /// return date.
    ///
    /// # Errors
    /// - `AlreadyIssued` when double issue is rejected and the book has an
    ///   open transaction
    /// - `BookNotFound` / `MemberNotFound` when references are verified
    pub fn issue(&self, request: IssueRequest) -> Result<Transaction> {
        let transactions = self.transactions();
        let mut log = transactions.load()?;

        if self.policy.reject_double_issue {
            if let Some(open) = log.iter().find(|t| t.book_id == request.book_id && t.is_open()) {
                tracing::warn!(
                    book_id = %request.book_id,
                    transaction_id = %open.id,
                    "rejected double issue"
                );
                return Err(ShelfError::AlreadyIssued {
                    book_id: request.book_id,
                    transaction_id: open.id.clone(),
                });
            }
        }

        if self.policy.verify_references {
            if !self.books().contains(&request.book_id)? {
                return Err(ShelfError::BookNotFound(request.book_id));
            }
            if !self.members().contains(&request.member_id)? {
                return Err(ShelfError::MemberNotFound(request.member_id));
            }
        }

        let marked = self
            .books()
            .update(&request.book_id, |book| book.status = BookStatus::Issued)?;
        if marked.is_none() {
            tracing::debug!(book_id = %request.book_id, "issuing unknown book; no status to update");
        }

        let status = if request.return_date.is_some() {
            TransactionStatus::Returned
        } else {
            TransactionStatus::Issued
        };
        let due_date = request
            .issue_date
            .checked_add_days(Days::new(u64::from(self.policy.loan_period_days)));

        let transaction = Transaction {
            id: self.ids.next_id(),
            book_id: request.book_id,
            member_id: request.member_id,
            issue_date: request.issue_date,
            due_date,
            return_date: request.return_date,
            status,
        };

        log.push(transaction.clone());
        transactions.save(&log)?;

        tracing::info!(
            transaction_id = %transaction.id,
            book_id = %transaction.book_id,
            member_id = %transaction.member_id,
            status = %transaction.status,
            "issued book"
        );

        Ok(transaction)
    }

    /// Close the open transaction for a book and make the book available
    ///
    /// The first open transaction in storage order is closed, with today
    /// as its return date.
    ///
    /// # Errors
    /// - `NoBookSelected` for an empty book id
    /// - `NotIssued` when the book has no open transaction; nothing is
    ///   written
    pub fn return_book(&self, book_id: &str) -> Result<Transaction> {
        if book_id.trim().is_empty() {
            return Err(ShelfError::NoBookSelected);
        }

        let transactions = self.transactions();
        let mut log = transactions.load()?;

        let Some(open) = log.iter_mut().find(|t| t.book_id == book_id && t.is_open()) else {
            tracing::debug!(book_id, "return rejected: no open transaction");
            return Err(ShelfError::NotIssued(book_id.to_string()));
        };

        open.close(self.clock.today());
        let closed = open.clone();
        transactions.save(&log)?;

        let freed = self
            .books()
            .update(book_id, |book| book.status = BookStatus::Available)?;
        if freed.is_none() {
            tracing::debug!(book_id, "returned unknown book; no status to update");
        }

        tracing::info!(
            transaction_id = %closed.id,
            book_id,
            "returned book"
        );

        Ok(closed)
    }

    /// First open transaction for a book
    pub fn open_transaction(&self, book_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .transactions()
            .load()?
            .into_iter()
            .find(|t| t.book_id == book_id && t.is_open()))
    }

    /// All open transactions, in storage order
    pub fn open_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions()
            .load()?
            .into_iter()
            .filter(Transaction::is_open)
            .collect())
    }

    /// Whether any open transaction references the member
    pub fn member_has_open_loans(&self, member_id: &str) -> Result<bool> {
        Ok(self
            .transactions()
            .load()?
            .iter()
            .any(|t| t.member_id == member_id && t.is_open()))
    }

    /// Compare book statuses against open transactions
    pub fn audit(&self) -> Result<ConsistencyReport> {
        let books = self.books().load()?;
        let transactions = self.transactions().load()?;

        let mut open_per_book: HashMap<&str, usize> = HashMap::new();
        for t in transactions.iter().filter(|t| t.is_open()) {
            *open_per_book.entry(t.book_id.as_str()).or_default() += 1;
        }

        let known: BTreeSet<&str> = books.iter().map(|b| b.id.as_str()).collect();
        let mut report = ConsistencyReport::default();

        for book in &books {
            let open = open_per_book.get(book.id.as_str()).copied().unwrap_or(0);
            match (book.status, open) {
                (BookStatus::Issued, 0) => report.issued_without_loan.push(book.id.clone()),
                (BookStatus::Available, n) if n > 0 => report.available_with_loan.push(book.id.clone()),
                _ => {}
            }
        }

        let mut multiple: Vec<String> = open_per_book
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        multiple.sort();
        report.multiple_open_loans = multiple;

        report.dangling_loans = transactions
            .iter()
            .filter(|t| t.is_open() && !known.contains(t.book_id.as_str()))
            .map(|t| t.id.clone())
            .collect();

        Ok(report)
    }
}
