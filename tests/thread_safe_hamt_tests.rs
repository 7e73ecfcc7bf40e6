//! Integration tests for sharing maps across threads.
//!
//! These tests only build with the `arc` feature, which switches node
//! sharing to `Arc` and makes maps `Send + Sync`.

#![cfg(feature = "arc")]

use persistent_hamt::persistent::PersistentHamt;
use rstest::rstest;
use std::sync::Arc;
use std::thread;

fn build(count: i32) -> PersistentHamt<i32, i32> {
    PersistentHamt::from_entries((0..count).map(|key| (key, key * 10))).unwrap()
}

// =============================================================================
// Cross-thread structural sharing
// =============================================================================

#[rstest]
fn test_cross_thread_structural_sharing() {
    let original = Arc::new(build(100));

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let map_clone = Arc::clone(&original);
            thread::spawn(move || {
                let updated = map_clone.assoc(index, -1).unwrap();
                assert_eq!(updated.find(&index), Ok(Some(&-1)));
                assert_eq!(updated.len(), 100);
                assert_eq!(map_clone.find(&index), Ok(Some(&(index * 10))));
                updated
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    for (index, map) in (0..).zip(&results) {
        assert_eq!(map.find(&index), Ok(Some(&-1)));
        for other in (0..4).filter(|other| *other != index) {
            assert_eq!(map.find(&other), Ok(Some(&(other * 10))));
        }
    }

    assert_eq!(original.len(), 100);
    for key in 0..100 {
        assert_eq!(original.find(&key), Ok(Some(&(key * 10))));
    }
}

#[rstest]
fn test_map_moves_between_threads() {
    let map = build(50);

    let handle = thread::spawn(move || {
        let removed = map.without(&0).unwrap();
        (map, removed)
    });
    let (map, removed) = handle.join().expect("Thread panicked");

    assert_eq!(map.len(), 50);
    assert_eq!(removed.len(), 49);
    assert_eq!(removed.find(&0), Ok(None));
}

#[rstest]
fn test_concurrent_readers_see_the_same_snapshot() {
    let snapshot = Arc::new(build(1000));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let snapshot = Arc::clone(&snapshot);
            thread::spawn(move || snapshot.values().copied().map(i64::from).sum::<i64>())
        })
        .collect();

    let expected: i64 = (0..1000_i64).map(|key| key * 10).sum();
    for handle in handles {
        assert_eq!(handle.join().expect("Thread panicked"), expected);
    }
}

#[rstest]
fn test_versions_dropped_on_other_threads_keep_shared_nodes_alive() {
    let base = build(200);
    let versions: Vec<_> = (0..4).map(|index| base.assoc(1000 + index, index).unwrap()).collect();

    let handles: Vec<_> = versions
        .into_iter()
        .map(|version| thread::spawn(move || drop(version)))
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(base.len(), 200);
    assert_eq!(base.find(&199), Ok(Some(&1990)));
}
