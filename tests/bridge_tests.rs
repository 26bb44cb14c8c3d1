//! Integration tests for the reference bridge.

use std::sync::Arc;
use std::thread;

use crossbind::{BridgeFault, CallOutcome, HandleTable, ManagedAddr};

#[test]
fn round_trip_then_fault() {
    let table = HandleTable::new();
    let a = ManagedAddr::new(0xa000);

    let h = table.acquire(a).unwrap();
    assert_eq!(table.acquire(a).unwrap(), h);
    assert_eq!(table.count(a), Some(2));

    assert!(!table.release(a).unwrap().is_removed());
    assert!(table.release(a).unwrap().is_removed());
    assert_eq!(table.count(a), None);
    assert_eq!(table.release(a), Err(BridgeFault::UnknownAddress(a)));
}

#[test]
fn managed_ids_stay_negative_and_unique() {
    let table = HandleTable::new();
    let mut seen = Vec::new();
    for round in 0..3 {
        for i in 0..50usize {
            let addr = ManagedAddr::new(0x1000 + i * 16);
            let h = table.acquire(addr).unwrap();
            assert!(h.is_managed(), "round {round}: {h} is not negative");
            seen.push(h);
            table.release(addr).unwrap();
        }
    }
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), seen.len());
    assert!(seen.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn concurrent_acquire_release() {
    const THREADS: usize = 8;
    const ADDRS: usize = 16;
    const ROUNDS: usize = 2_000;

    let table = HandleTable::new();
    let addrs: Vec<ManagedAddr> = (0..ADDRS).map(|i| ManagedAddr::new(0x10_0000 + i * 8)).collect();

    thread::scope(|s| {
        for t in 0..THREADS {
            let table = &table;
            let addrs = &addrs;
            s.spawn(move || {
                let mut held: Vec<ManagedAddr> = Vec::new();
                for round in 0..ROUNDS {
                    let addr = addrs[(t * 7 + round * 3) % ADDRS];
                    table.acquire(addr).unwrap();
                    held.push(addr);
                    if round % 3 == 2 {
                        for addr in held.drain(..2) {
                            table.release(addr).unwrap();
                        }
                    }
                }
                for addr in held {
                    table.release(addr).unwrap();
                }
            });
        }
    });

    assert!(table.is_empty());
}

#[test]
fn concurrent_counts_match_outstanding_acquires() {
    const THREADS: usize = 6;
    const PER_THREAD: u64 = 500;

    let table = HandleTable::new();
    let shared = ManagedAddr::new(0xbeef);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    table.acquire(shared).unwrap();
                }
            });
        }
    });
    assert_eq!(table.count(shared), Some(THREADS as u64 * PER_THREAD));

    let handle = table.handle_of(shared).unwrap();
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD - 1 {
                    table.release_handle(handle).unwrap();
                }
            });
        }
    });
    assert_eq!(table.count(shared), Some(THREADS as u64));
}

#[test]
fn objects_outlive_managed_references() {
    let table = HandleTable::new();
    let handle = {
        let obj = Arc::new(vec![1u8, 2, 3]);
        table.acquire_object(&obj).unwrap()
    };

    let obj: Arc<Vec<u8>> = table.get(handle).unwrap();
    assert_eq!(*obj, vec![1, 2, 3]);
    drop(obj);

    assert!(table.release_handle(handle).unwrap().is_removed());
    assert!(table.get::<Vec<u8>>(handle).is_none());
    assert_eq!(
        table.release_handle(handle),
        Err(BridgeFault::UnknownHandle(handle))
    );
}

#[test]
fn raised_calls_do_not_acquire() {
    let table = HandleTable::new();
    let outcome = CallOutcome::<Arc<String>>::from_result(Err("name must not be empty"));
    assert_eq!(outcome.into_handle(&table).unwrap(), 0);
    assert!(table.is_empty());
    assert_eq!(
        crossbind_runtime::take_error().as_deref(),
        Some("name must not be empty")
    );
}
