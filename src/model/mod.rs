//! Record types
//!
//! The three collections persisted by the store. Field names serialize in
//! camelCase and dates as `YYYY-MM-DD`, so stored documents look like:
//!
//! ```text
//! library-books         [{"id":"B001","title":..,"status":"Available"}, ..]
//! library-members       [{"id":"M001","name":..,"joinDate":"2024-03-01"}, ..]
//! library-transactions  [{"id":"1718000000000","bookId":"B001",
//!                         "issueDate":"2024-03-02","returnDate":null,
//!                         "status":"Issued"}, ..]
//! ```

mod book;
mod member;
mod transaction;

pub use book::{Book, BookStatus};
pub use member::Member;
pub use transaction::{Transaction, TransactionStatus};

/// A record stored in a keyed collection
pub trait Record: Clone + serde::Serialize + serde::de::DeserializeOwned {
    /// Substrate key holding the collection
    const STORE_KEY: &'static str;

    /// Unique identifier within the collection
    fn id(&self) -> &str;
}
