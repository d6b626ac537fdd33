//! Library Module
//!
//! The facade that owns a store and exposes every record and circulation
//! operation.
//!
//! ## Responsibilities
//! - Open the configured store (file-backed or in-memory)
//! - CRUD over books and members, with optional deletion guards
//! - Route issue/return through the circulation manager
//! - Dashboard counters and the loan listing

use std::path::Path;
use std::sync::Arc;

use crate::circulation::{CirculationManager, CirculationPolicy, ConsistencyReport, IssueRequest};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dashboard::{self, DashboardStats, LoanView};
use crate::error::{Result, ShelfError};
use crate::ids::{highest_suffix, next_prefixed_id, ClockIdGenerator, IdGenerator};
use crate::model::{Book, Member, Transaction};
use crate::repository::Collection;
use crate::store::{CompactionResult, KvStore, LogStore, MemoryStore};
use crate::wal::RecoveryResult;

/// Prefix for generated book ids
pub const BOOK_ID_PREFIX: &str = "B";

/// Prefix for generated member ids
pub const MEMBER_ID_PREFIX: &str = "M";

/// Books, members and loans over one store
pub struct Library {
    config: Config,
    store: Box<dyn KvStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Library {
    /// Open or create a file-backed library in `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        let store = LogStore::open_with_config(&config)?;
        tracing::info!(data_dir = %config.data_dir.display(), "opened library");

        let library = Self::with_store(Box::new(store), config);
        let last_id = highest_suffix("", library.transaction_collection().ids()?);
        Ok(library.with_id_generator(Arc::new(ClockIdGenerator::resuming_after(
            last_id.unwrap_or(0),
        ))))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// A library whose records vanish on drop
    pub fn in_memory(config: Config) -> Self {
        Self::with_store(Box::new(MemoryStore::new()), config)
    }

    /// A library over any store, with wall-clock ids and dates
    pub fn with_store(store: Box<dyn KvStore>, config: Config) -> Self {
        Self {
            config,
            store,
            ids: Arc::new(ClockIdGenerator::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the transaction id source
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the date source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub fn book_collection(&self) -> Collection<'_, Book> {
        Collection::new(self.store.as_ref())
    }

    pub fn member_collection(&self) -> Collection<'_, Member> {
        Collection::new(self.store.as_ref())
    }

    pub fn transaction_collection(&self) -> Collection<'_, Transaction> {
        Collection::new(self.store.as_ref())
    }

    fn circulation(&self) -> CirculationManager<'_> {
        CirculationManager::new(
            self.store.as_ref(),
            self.ids.as_ref(),
            self.clock.as_ref(),
            CirculationPolicy::from(&self.config),
        )
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Catalogue a new available book under the next `B###` id
    pub fn add_book(&self, title: &str, author: &str, isbn: &str) -> Result<Book> {
        let books = self.book_collection();
        let id = next_prefixed_id(BOOK_ID_PREFIX, books.ids()?)?;
        let book = Book::new(id, title, author, isbn);
        books.append(book.clone())?;
        tracing::info!(book_id = %book.id, "added book");
        Ok(book)
    }

    /// Insert or replace a book by id
    pub fn save_book(&self, book: Book) -> Result<()> {
        tracing::debug!(book_id = %book.id, "saving book");
        self.book_collection().upsert(book)
    }

    pub fn book(&self, id: &str) -> Result<Option<Book>> {
        self.book_collection().find(id)
    }

    pub fn books(&self) -> Result<Vec<Book>> {
        self.book_collection().load()
    }

    /// Books that can be issued right now
    pub fn available_books(&self) -> Result<Vec<Book>> {
        Ok(self
            .books()?
            .into_iter()
            .filter(Book::is_available)
            .collect())
    }

    /// Remove a book; returns whether one was removed
    ///
    /// With `guard_deletes`, a book with an open transaction is refused.
    pub fn delete_book(&self, id: &str) -> Result<bool> {
        if self.config.guard_deletes && self.circulation().open_transaction(id)?.is_some() {
            return Err(ShelfError::BookOnLoan(id.to_string()));
        }
        let removed = self.book_collection().delete(id)?;
        tracing::info!(book_id = id, removed, "deleted book");
        Ok(removed)
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Register a new member under the next `M###` id, joined today
    pub fn add_member(&self, name: &str, email: &str, phone: &str) -> Result<Member> {
        let members = self.member_collection();
        let id = next_prefixed_id(MEMBER_ID_PREFIX, members.ids()?)?;
        let member = Member::new(id, name, email, phone).joined(self.clock.today());
        members.append(member.clone())?;
        tracing::info!(member_id = %member.id, "added member");
        Ok(member)
    }

    /// Insert or replace a member by id
    pub fn save_member(&self, member: Member) -> Result<()> {
        tracing::debug!(member_id = %member.id, "saving member");
        self.member_collection().upsert(member)
    }

    pub fn member(&self, id: &str) -> Result<Option<Member>> {
        self.member_collection().find(id)
    }

    pub fn members(&self) -> Result<Vec<Member>> {
        self.member_collection().load()
    }

    /// Remove a member; returns whether one was removed
    ///
    /// Past transactions keep the member id. With `guard_deletes`, a member
    /// with an open transaction is refused.
    pub fn delete_member(&self, id: &str) -> Result<bool> {
        if self.config.guard_deletes && self.circulation().member_has_open_loans(id)? {
            return Err(ShelfError::MemberHasLoans(id.to_string()));
        }
        let removed = self.member_collection().delete(id)?;
        tracing::info!(member_id = id, removed, "deleted member");
        Ok(removed)
    }

    // =========================================================================
    // Circulation
    // =========================================================================

    pub fn issue(&self, request: IssueRequest) -> Result<Transaction> {
        self.circulation().issue(request)
    }

    /// Issue today
    pub fn issue_now(&self, book_id: &str, member_id: &str) -> Result<Transaction> {
        self.issue(IssueRequest::new(book_id, member_id, self.clock.today()))
    }

    pub fn return_book(&self, book_id: &str) -> Result<Transaction> {
        self.circulation().return_book(book_id)
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        self.transaction_collection().load()
    }

    pub fn open_transaction(&self, book_id: &str) -> Result<Option<Transaction>> {
        self.circulation().open_transaction(book_id)
    }

    /// Transactions joined with titles and names, newest first
    pub fn loan_history(&self) -> Result<Vec<LoanView>> {
        Ok(dashboard::loan_history(
            &self.books()?,
            &self.members()?,
            &self.transactions()?,
            self.clock.today(),
        ))
    }

    pub fn stats(&self) -> Result<DashboardStats> {
        Ok(DashboardStats::compute(
            &self.books()?,
            &self.members()?,
            &self.transactions()?,
            self.clock.today(),
        ))
    }

    pub fn audit(&self) -> Result<ConsistencyReport> {
        self.circulation().audit()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Rewrite the store's log down to its live state
    pub fn compact(&self) -> Result<CompactionResult> {
        self.store.compact()
    }

    /// Integrity report of the store's log (None for in-memory stores)
    pub fn verify_store(&self) -> Result<Option<RecoveryResult>> {
        self.store.verify()
    }

    /// Drop all three collections
    pub fn reset(&self) -> Result<()> {
        self.book_collection().clear()?;
        self.member_collection().clear()?;
        self.transaction_collection().clear()?;
        tracing::info!("cleared all collections");
        Ok(())
    }

    /// Sync pending writes and close
    pub fn close(self) -> Result<()> {
        self.store.sync()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Today according to the library's clock
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }
}
