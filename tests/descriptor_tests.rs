use std::sync::{Arc, Barrier};
use std::thread;

use xmlrpc_serde::descriptor::{cached_descriptors, struct_descriptor};

// Kept in its own test binary: the cache is process-wide, so the count below
// is exact only while no other test builds descriptors.

static RACED_FIELDS: &[&str] = &["callerId", "callerName", "issuedAt"];

#[test]
fn test_descriptor_is_built_once_under_contention() {
    const THREADS: usize = 8;
    let before = cached_descriptors();
    let barrier = Barrier::new(THREADS);

    let seen: Vec<_> = thread::scope(|scope| {
        let barrier = &barrier;
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    struct_descriptor(RACED_FIELDS)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(seen.len(), THREADS);
    assert!(seen.iter().all(|d| Arc::ptr_eq(d, &seen[0])));
    assert_eq!(seen[0].fields(), RACED_FIELDS);
    assert_eq!(cached_descriptors(), before + 1);
}
