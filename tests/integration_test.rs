use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use strand::prelude::*;

#[test]
fn test_value_is_returned() {
    let manager = TaskManager::new();
    let handle = manager.spawn(|| 21 * 2);
    assert_eq!(handle.get().unwrap(), 42);
}

#[test]
fn test_panic_is_reraised_from_get() {
    let manager = TaskManager::new();
    let handle = manager.spawn(|| -> i32 { panic!("boom") });

    match handle.get() {
        Err(TaskError::Panicked(info)) => assert!(info.message.contains("boom")),
        other => panic!("expected a panic outcome, got {:?}", other),
    }

    manager.wait_all();
    assert_eq!(manager.live_count(), 0);
}

#[test]
fn test_hundred_random_sleeps() {
    let manager = TaskManager::new();

    let handles: Vec<_> = (0..100usize)
        .map(|i| {
            let delay = rand::thread_rng().gen_range(0..20);
            manager.spawn(move || {
                thread::sleep(Duration::from_millis(delay));
                i
            })
        })
        .collect();

    manager.wait_all();

    assert_eq!(manager.live_count(), 0);
    assert!(handles.iter().all(|h| h.wait_for(Duration::ZERO).unwrap() == WaitStatus::Ready));

    let values: HashSet<usize> = handles.iter().map(|h| h.get().unwrap()).collect();
    assert_eq!(values, (0..100).collect());
}

#[test]
fn test_discarded_handle_does_not_block() {
    let manager = TaskManager::new();
    let finished = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    {
        let finished = finished.clone();
        drop(manager.spawn(move || {
            thread::sleep(Duration::from_millis(100));
            finished.fetch_add(1, Ordering::SeqCst);
        }));
    }
    // Dropping the handle returned well before the task could finish.
    assert!(start.elapsed() < Duration::from_millis(100));

    manager.wait_all();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn test_precomputed_result() {
    let manager = TaskManager::new();
    let handle = manager.spawn_with_result(99u64);

    assert_eq!(manager.live_count(), 0);
    assert!(handle.is_ready());
    assert_eq!(handle.try_get().unwrap().unwrap(), 99);
    assert_eq!(handle.wait_for(Duration::from_secs(1)).unwrap(), WaitStatus::Deferred);
}

#[test]
fn test_concurrent_wait_all() {
    let manager = Arc::new(TaskManager::new());

    for i in 0..50u64 {
        let _ = manager.spawn(move || thread::sleep(Duration::from_millis(5 + i % 10)));
    }

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                manager.wait_all();
                manager.live_count()
            })
        })
        .collect();

    // Nothing is spawned once the waiters start, so each sees an empty manager.
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), 0);
    }
    assert_eq!(manager.live_count(), 0);
}

#[test]
fn test_spawn_while_waiting() {
    let manager = Arc::new(TaskManager::new());
    let first = manager.spawn(|| thread::sleep(Duration::from_millis(30)));

    let waiter = {
        let manager = manager.clone();
        thread::spawn(move || manager.wait_all())
    };

    thread::sleep(Duration::from_millis(5));
    let second = manager.spawn(|| 2);

    waiter.join().unwrap();
    manager.wait_all();
    assert!(first.is_ready());
    assert_eq!(second.get().unwrap(), 2);
}

#[test]
fn test_drop_blocks_until_tasks_finish() {
    let finished = Arc::new(AtomicUsize::new(0));

    {
        let manager = TaskManager::new();
        for _ in 0..5 {
            let finished = finished.clone();
            let _ = manager.spawn(move || {
                thread::sleep(Duration::from_millis(50));
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }
    }

    assert_eq!(finished.load(Ordering::SeqCst), 5);
}

#[test]
fn test_fallible_task_error() {
    let manager = TaskManager::new();
    let handle = manager.spawn_fallible(|| "not a number".parse::<i32>());

    let err = handle.get().unwrap_err();
    assert!(err.downcast_ref::<std::num::ParseIntError>().is_some());
}

#[test]
fn test_observers_on_many_threads() {
    let manager = TaskManager::new();
    let handle = manager.spawn(|| {
        thread::sleep(Duration::from_millis(20));
        String::from("shared")
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || handle.get().unwrap())
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), "shared");
    }
}

#[test]
fn test_wait_until_deadline() {
    let manager = TaskManager::new();
    let handle = manager.spawn(|| thread::sleep(Duration::from_millis(200)));

    let status = handle
        .wait_until(Instant::now() + Duration::from_millis(10))
        .unwrap();
    assert_eq!(status, WaitStatus::Timeout);

    assert_eq!(handle.wait().unwrap(), WaitStatus::Ready);
}
