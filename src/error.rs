//! Error types for ShelfKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Unified error type for ShelfKV operations
#[derive(Debug, Error)]
pub enum ShelfError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record list under '{key}': {source}")]
    MalformedRecords {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Circulation Errors (shown to the user)
    // -------------------------------------------------------------------------
    #[error("Please select a book to return")]
    NoBookSelected,

    #[error("This book is not currently issued: {0}")]
    NotIssued(String),

    #[error("Book {book_id} is already issued (transaction {transaction_id})")]
    AlreadyIssued {
        book_id: String,
        transaction_id: String,
    },

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Book {0} is currently issued and cannot be deleted")]
    BookOnLoan(String),

    #[error("Member {0} has outstanding books and cannot be deleted")]
    MemberHasLoans(String),

    #[error("No ids left for prefix '{0}'")]
    IdSpaceExhausted(String),
}

impl ShelfError {
    /// Whether this error is a rejected user action rather than a storage
    /// or I/O failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ShelfError::NoBookSelected
                | ShelfError::NotIssued(_)
                | ShelfError::AlreadyIssued { .. }
                | ShelfError::BookNotFound(_)
                | ShelfError::MemberNotFound(_)
                | ShelfError::BookOnLoan(_)
                | ShelfError::MemberHasLoans(_)
                | ShelfError::IdSpaceExhausted(_)
        )
    }
}

impl From<bincode::Error> for ShelfError {
    fn from(e: bincode::Error) -> Self {
        ShelfError::Serialization(e.to_string())
    }
}
