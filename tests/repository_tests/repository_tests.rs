//! Tests for keyed record collections
//!
//! These tests verify:
//! - Absent keys read as empty lists
//! - Whole-list save/load preserves order and fields
//! - Optional dates survive save/load on both stores and across reopen
//! - Upsert, append, update and delete semantics
//! - Malformed stored JSON is reported, not swallowed

use chrono::NaiveDate;
use shelfkv::config::WalSyncStrategy;
use shelfkv::model::{Book, BookStatus, Member, Record, Transaction, TransactionStatus};
use shelfkv::repository::Collection;
use shelfkv::store::{KvStore, LogStore, MemoryStore};
use shelfkv::ShelfError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_books() -> Vec<Book> {
    vec![
        Book::new("B001", "Dune", "Frank Herbert", "9780441013593"),
        Book::new("B002", "Emma", "Jane Austen", "9780141439587"),
        Book::new("B003", "Ubik", "Philip K. Dick", "9780547572291"),
    ]
}

fn sample_members() -> Vec<Member> {
    vec![
        Member::new("M001", "Ada", "ada@example.com", "555-0100").joined(date(2023, 11, 5)),
        Member::new("M002", "Lin", "lin@example.com", "555-0101"),
    ]
}

fn sample_transactions() -> Vec<Transaction> {
    vec![
        // Open loan with a due date
        Transaction {
            id: "1709251200000".to_string(),
            book_id: "B001".to_string(),
            member_id: "M001".to_string(),
            issue_date: date(2024, 3, 1),
            due_date: Some(date(2024, 3, 15)),
            return_date: None,
            status: TransactionStatus::Issued,
        },
        // Returned loan with both dates
        Transaction {
            id: "1709337600000".to_string(),
            book_id: "B002".to_string(),
            member_id: "M002".to_string(),
            issue_date: date(2024, 3, 2),
            due_date: Some(date(2024, 3, 16)),
            return_date: Some(date(2024, 3, 9)),
            status: TransactionStatus::Returned,
        },
        // Returned loan recorded without a due date
        Transaction {
            id: "1709424000000".to_string(),
            book_id: "B003".to_string(),
            member_id: "M001".to_string(),
            issue_date: date(2024, 3, 3),
            due_date: None,
            return_date: Some(date(2024, 3, 4)),
            status: TransactionStatus::Returned,
        },
        // Open loan with neither date
        Transaction {
            id: "1709510400000".to_string(),
            book_id: "B004".to_string(),
            member_id: "M002".to_string(),
            issue_date: date(2024, 3, 4),
            due_date: None,
            return_date: None,
            status: TransactionStatus::Issued,
        },
    ]
}

fn save_member_and_transaction_lists(store: &dyn KvStore) {
    Collection::<Member>::new(store).save(&sample_members()).unwrap();
    Collection::<Transaction>::new(store)
        .save(&sample_transactions())
        .unwrap();
}

fn assert_member_and_transaction_lists(store: &dyn KvStore) {
    assert_eq!(Collection::<Member>::new(store).load().unwrap(), sample_members());
    assert_eq!(
        Collection::<Transaction>::new(store).load().unwrap(),
        sample_transactions()
    );
}

fn reopen(temp_dir: &TempDir) -> LogStore {
    LogStore::open(temp_dir.path(), WalSyncStrategy::EveryWrite).unwrap()
}

// =============================================================================
// Load / Save Tests
// =============================================================================

#[test]
fn test_absent_key_loads_empty() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);

    assert!(books.load().unwrap().is_empty());
    assert_eq!(books.count().unwrap(), 0);
    assert_eq!(books.find("B001").unwrap(), None);
}

#[test]
fn test_save_then_load_preserves_order() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);

    books.save(&sample_books()).unwrap();

    assert_eq!(books.load().unwrap(), sample_books());
    assert_eq!(books.ids().unwrap(), vec!["B001", "B002", "B003"]);
}

#[test]
fn test_collections_use_separate_keys() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    let members: Collection<Member> = Collection::new(&store);

    books.save(&sample_books()).unwrap();
    members
        .save(&[Member::new("M001", "Ada", "ada@example.com", "555-0100")])
        .unwrap();

    assert!(store.get(Book::STORE_KEY).unwrap().is_some());
    assert!(store.get(Member::STORE_KEY).unwrap().is_some());
    assert_eq!(store.get(Transaction::STORE_KEY).unwrap(), None);
    assert_eq!(books.count().unwrap(), 3);
    assert_eq!(members.count().unwrap(), 1);
}

#[test]
fn test_stored_json_shape() {
    let store = MemoryStore::new();
    let transactions: Collection<Transaction> = Collection::new(&store);

    transactions
        .save(&[Transaction {
            id: "1718000000000".to_string(),
            book_id: "B001".to_string(),
            member_id: "M001".to_string(),
            issue_date: date(2024, 3, 2),
            due_date: None,
            return_date: None,
            status: TransactionStatus::Issued,
        }])
        .unwrap();

    let json = store.get(Transaction::STORE_KEY).unwrap().unwrap();
    assert_eq!(
        json,
        r#"[{"id":"1718000000000","bookId":"B001","memberId":"M001","issueDate":"2024-03-02","returnDate":null,"status":"Issued"}]"#
    );
}

#[test]
fn test_loads_records_without_optional_fields() {
    let store = MemoryStore::new();
    store
        .set(
            Book::STORE_KEY,
            r#"[{"id":"B010","title":"Kindred","author":"Octavia Butler","isbn":"1"}]"#.to_string(),
        )
        .unwrap();
    store
        .set(
            Member::STORE_KEY,
            r#"[{"id":"M010","name":"Lin","email":"lin@example.com","phone":"1"}]"#.to_string(),
        )
        .unwrap();

    let book = Collection::<Book>::new(&store).find("B010").unwrap().unwrap();
    let member = Collection::<Member>::new(&store).find("M010").unwrap().unwrap();

    assert_eq!(book.status, BookStatus::Available);
    assert_eq!(member.join_date, None);
}

#[test]
fn test_malformed_json_is_an_error() {
    let store = MemoryStore::new();
    store.set(Book::STORE_KEY, "{not json".to_string()).unwrap();

    let books: Collection<Book> = Collection::new(&store);

    match books.load() {
        Err(ShelfError::MalformedRecords { key, .. }) => assert_eq!(key, Book::STORE_KEY),
        other => panic!("Expected MalformedRecords, got {:?}", other),
    }
}

// =============================================================================
// Mutation Tests
// =============================================================================

#[test]
fn test_upsert_replaces_in_place() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    books.save(&sample_books()).unwrap();

    let mut emma = Book::new("B002", "Emma (annotated)", "Jane Austen", "9780141439587");
    emma.status = BookStatus::Issued;
    books.upsert(emma.clone()).unwrap();

    let loaded = books.load().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[1], emma);
    assert_eq!(books.ids().unwrap(), vec!["B001", "B002", "B003"]);
}

#[test]
fn test_upsert_appends_new_id() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    books.save(&sample_books()).unwrap();

    books
        .upsert(Book::new("B004", "Solaris", "Stanislaw Lem", "9780156027601"))
        .unwrap();

    assert_eq!(books.ids().unwrap(), vec!["B001", "B002", "B003", "B004"]);
}

#[test]
fn test_update_applies_closure() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    books.save(&sample_books()).unwrap();

    let updated = books
        .update("B003", |b| b.status = BookStatus::Issued)
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, BookStatus::Issued);
    assert_eq!(books.find("B003").unwrap().unwrap().status, BookStatus::Issued);
    assert_eq!(books.find("B001").unwrap().unwrap().status, BookStatus::Available);
}

#[test]
fn test_update_missing_id_writes_nothing() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);

    let updated = books.update("B999", |b| b.status = BookStatus::Issued).unwrap();

    assert_eq!(updated, None);
    assert_eq!(store.get(Book::STORE_KEY).unwrap(), None);
}

#[test]
fn test_delete_removes_one_record() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    books.save(&sample_books()).unwrap();

    assert!(books.delete("B002").unwrap());
    assert_eq!(books.ids().unwrap(), vec!["B001", "B003"]);

    assert!(!books.delete("B002").unwrap());
    assert_eq!(books.count().unwrap(), 2);
}

#[test]
fn test_contains_and_clear() {
    let store = MemoryStore::new();
    let books: Collection<Book> = Collection::new(&store);
    books.append(Book::new("B001", "Dune", "Frank Herbert", "1")).unwrap();

    assert!(books.contains("B001").unwrap());
    assert!(!books.contains("B002").unwrap());

    assert!(books.clear().unwrap());
    assert!(books.load().unwrap().is_empty());
    assert!(!books.clear().unwrap());
}

// =============================================================================
// Round-trip Tests (optional dates)
// =============================================================================

#[test]
fn test_member_and_transaction_lists_memory_store() {
    let store = MemoryStore::new();

    save_member_and_transaction_lists(&store);

    assert_member_and_transaction_lists(&store);
}

#[test]
fn test_member_and_transaction_lists_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = reopen(&temp_dir);
        save_member_and_transaction_lists(&store);
        assert_member_and_transaction_lists(&store);
        store.close().unwrap();
    }

    let store = reopen(&temp_dir);
    assert_member_and_transaction_lists(&store);

    // Loaded lists keep which dates were present
    let members = Collection::<Member>::new(&store).load().unwrap();
    assert_eq!(members[0].join_date, Some(date(2023, 11, 5)));
    assert_eq!(members[1].join_date, None);

    let transactions = Collection::<Transaction>::new(&store).load().unwrap();
    assert!(transactions[0].is_open());
    assert_eq!(transactions[2].due_date, None);
    assert_eq!(transactions[2].return_date, Some(date(2024, 3, 4)));
}

#[test]
fn test_member_and_transaction_lists_survive_compaction() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = reopen(&temp_dir);
        save_member_and_transaction_lists(&store);
        // Overwrite once so compaction has something to drop
        save_member_and_transaction_lists(&store);
        store.compact().unwrap();
    }

    let store = reopen(&temp_dir);
    assert_member_and_transaction_lists(&store);
    assert_eq!(store.key_count(), 2);
}
