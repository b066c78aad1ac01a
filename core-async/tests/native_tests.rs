//! Integration tests for the runtime facade.

use core_async::sync::{self, CancellationToken};
use core_async::time::{self, sleep_or_cancelled, Duration, SleepOutcome};
use core_async::task;
use std::sync::Arc;

#[core_async::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[core_async::test]
async fn test_timeout_failure() {
    let result = time::timeout(Duration::from_millis(10), async {
        time::sleep(Duration::from_millis(200)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[core_async::test(start_paused)]
async fn test_sleep_or_cancelled_elapses_on_paused_clock() {
    let token = CancellationToken::new();
    let start = time::Instant::now();

    let outcome = sleep_or_cancelled(Duration::from_secs(5), &token).await;

    assert_eq!(outcome, SleepOutcome::Elapsed);
    // Paused clock auto-advances, so no real time is spent.
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[core_async::test]
async fn test_sleep_or_cancelled_returns_immediately_when_already_cancelled() {
    let token = CancellationToken::new();
    token.cancel();

    let outcome = sleep_or_cancelled(Duration::from_secs(3600), &token).await;

    assert_eq!(outcome, SleepOutcome::Cancelled);
    assert!(outcome.is_cancelled());
}

#[core_async::test]
async fn test_sleep_or_cancelled_interrupted_mid_sleep() {
    let token = CancellationToken::new();
    let canceller = token.clone();

    task::spawn(async move {
        time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let start = time::Instant::now();
    let outcome = sleep_or_cancelled(Duration::from_secs(30), &token).await;

    assert_eq!(outcome, SleepOutcome::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[core_async::test]
async fn test_child_token_follows_parent() {
    let parent = CancellationToken::new();
    let child = parent.child_token();

    parent.cancel();

    assert!(child.is_cancelled());
}

#[core_async::test]
async fn test_mutex_shared_between_tasks() {
    let counter = Arc::new(sync::Mutex::new(0));
    let mut handles = vec![];

    for _ in 0..10 {
        let counter = counter.clone();
        handles.push(task::spawn(async move {
            *counter.lock().await += 1;
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*counter.lock().await, 10);
}

#[core_async::test]
async fn test_broadcast_channel() {
    let (tx, mut rx1) = sync::broadcast::channel(10);
    let mut rx2 = tx.subscribe();

    for i in 0..3 {
        tx.send(i).unwrap();
    }

    for expected in 0..3 {
        assert_eq!(rx1.recv().await.unwrap(), expected);
        assert_eq!(rx2.recv().await.unwrap(), expected);
    }
}

#[core_async::test]
async fn test_time_utilities() {
    let now_millis = time::now_millis();
    let now_secs = time::now_secs();

    assert!(now_millis > 0);
    assert!(now_millis / 1000 >= now_secs - 1);
}
