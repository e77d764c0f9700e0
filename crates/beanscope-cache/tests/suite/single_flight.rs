use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use beanscope_cache::{InvalidationDomain, ModificationTracker, VersionedCache};

#[test]
fn concurrent_callers_share_one_computation() {
    const THREADS: usize = 8;

    let tracker = Arc::new(ModificationTracker::new());
    let cache = Arc::new(VersionedCache::<&'static str, usize>::new("single-flight"));
    let computations = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            let cache = Arc::clone(&cache);
            let computations = Arc::clone(&computations);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_compute(&"key", &tracker, &[InvalidationDomain::Structural], || {
                    thread::sleep(Duration::from_millis(50));
                    computations.fetch_add(1, Ordering::SeqCst) + 100
                })
            })
        })
        .collect();

    let results: Vec<Arc<usize>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(computations.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|value| Arc::ptr_eq(value, &results[0])));
    assert_eq!(*results[0], 100);

    let stats = cache.stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.hits, (THREADS - 1) as u64);
}

#[test]
fn waiters_retry_after_a_panicking_computation() {
    let tracker = Arc::new(ModificationTracker::new());
    let cache = Arc::new(VersionedCache::<u8, u8>::new("panic"));
    let started = Arc::new(Barrier::new(2));

    let panicking = {
        let tracker = Arc::clone(&tracker);
        let cache = Arc::clone(&cache);
        let started = Arc::clone(&started);
        thread::spawn(move || {
            cache.get_or_compute(&1, &tracker, &[InvalidationDomain::Structural], || {
                started.wait();
                thread::sleep(Duration::from_millis(30));
                panic!("computation failed");
            })
        })
    };

    started.wait();
    let value = cache.get_or_compute(&1, &tracker, &[InvalidationDomain::Structural], || 9);
    assert_eq!(*value, 9);
    assert!(panicking.join().is_err());
}
