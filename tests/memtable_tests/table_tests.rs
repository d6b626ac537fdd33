//! MemTable Tests
//!
//! Tests verify:
//! - Basic get/put/remove
//! - Size tracking
//! - Sorted snapshots
//! - Clear functionality
//! - Concurrent access patterns

use shelfkv::memtable::MemTable;

fn put(memtable: &MemTable, key: &str, value: &str) -> usize {
    memtable.put(key.to_string(), value.to_string())
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();

    put(&memtable, "library-books", "[]");

    assert_eq!(memtable.get("library-books"), Some("[]".to_string()));
    assert!(memtable.contains_key("library-books"));
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = MemTable::new();
    assert_eq!(memtable.get("nonexistent"), None);
    assert!(!memtable.contains_key("nonexistent"));
}

#[test]
fn test_put_overwrites_existing() {
    let memtable = MemTable::new();

    put(&memtable, "key1", "value1");
    put(&memtable, "key1", "value2");

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get("key1"), Some("value2".to_string()));
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_existing_key() {
    let memtable = MemTable::new();

    put(&memtable, "key1", "value1");

    assert!(memtable.remove("key1"));
    assert_eq!(memtable.get("key1"), None);
    assert!(memtable.is_empty());
}

#[test]
fn test_remove_nonexistent_key() {
    let memtable = MemTable::new();

    assert!(!memtable.remove("nonexistent"));
    assert_eq!(memtable.entry_count(), 0);
}

#[test]
fn test_put_after_remove() {
    let memtable = MemTable::new();

    put(&memtable, "key1", "value1");
    memtable.remove("key1");
    put(&memtable, "key1", "value2");

    assert_eq!(memtable.get("key1"), Some("value2".to_string()));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracking_put() {
    let memtable = MemTable::new();

    let size = put(&memtable, "key", "value");

    assert_eq!(size, "key".len() + "value".len());
    assert_eq!(memtable.size(), size);
}

#[test]
fn test_size_tracking_overwrite() {
    let memtable = MemTable::new();

    put(&memtable, "key", "short");
    let size_after_first = memtable.size();

    put(&memtable, "key", "much_longer_value");
    let size_after_second = memtable.size();

    assert_eq!(size_after_first, "key".len() + "short".len());
    assert_eq!(size_after_second, "key".len() + "much_longer_value".len());
}

#[test]
fn test_size_tracking_remove() {
    let memtable = MemTable::new();

    put(&memtable, "a", "1");
    put(&memtable, "key", "value");
    memtable.remove("key");

    assert_eq!(memtable.size(), 2);
}

// =============================================================================
// Snapshot / Clear Tests
// =============================================================================

#[test]
fn test_snapshot_sorted() {
    let memtable = MemTable::new();

    put(&memtable, "library-transactions", "[]");
    put(&memtable, "library-books", "[]");
    put(&memtable, "library-members", "[]");

    let keys: Vec<String> = memtable.snapshot().into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["library-books", "library-members", "library-transactions"]
    );
    assert_eq!(memtable.keys(), keys);
}

#[test]
fn test_clear() {
    let memtable = MemTable::new();

    for i in 0..10 {
        put(&memtable, &format!("key{}", i), "v");
    }
    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert!(memtable.snapshot().is_empty());
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn test_empty_value() {
    let memtable = MemTable::new();

    put(&memtable, "key", "");

    assert_eq!(memtable.get("key"), Some(String::new()));
}

#[test]
fn test_many_entries() {
    let memtable = MemTable::new();

    for i in 0..1000 {
        put(&memtable, &format!("key{:04}", i), &format!("value{}", i));
    }

    assert_eq!(memtable.entry_count(), 1000);

    let entries = memtable.snapshot();
    for pair in entries.windows(2) {
        assert!(pair[0].0 < pair[1].0);
    }
}

// =============================================================================
// Concurrent Access Tests (Basic)
// =============================================================================

#[test]
fn test_concurrent_reads() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(MemTable::new());
    put(&memtable, "key", "value");

    let mut handles = vec![];

    for _ in 0..10 {
        let mt = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(mt.get("key"), Some("value".to_string()));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(MemTable::new());

    let mut handles = vec![];

    for i in 0..10 {
        let mt = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for j in 0..10 {
                mt.put(format!("key{}_{}", i, j), format!("value{}_{}", i, j));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 100);
}
