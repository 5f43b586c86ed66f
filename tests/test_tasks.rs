mod common;

use std::{sync::atomic::Ordering, time::Duration};

use task_lifecycle::{Environment, ShutdownError};
use tokio::time::pause;

use common::{count_run, counter, fail_after, panic_after, until_cancelled};

#[tokio::test]
async fn test_failing_task_cancels_the_others() {
    pause();
    let env = Environment::new();
    let exited = counter();

    let task1_exited = exited.clone();
    env.go(move |token| until_cancelled(token, task1_exited));
    env.go(|_| fail_after(Duration::from_millis(10), "task 2 failed"));
    let task3_exited = exited.clone();
    env.go(move |token| until_cancelled(token, task3_exited));

    let err = env.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "task 2 failed");
    assert_eq!(exited.load(Ordering::SeqCst), 2);
    assert_eq!(env.outstanding(), 0);
    assert!(env.is_cancelled());
}

#[tokio::test]
async fn test_go_after_stop_never_runs() {
    pause();
    let env = Environment::new();
    let runs = counter();

    let first = runs.clone();
    env.go(move |_| count_run(first));
    env.stop();
    let second = runs.clone();
    env.go(move |_| count_run(second));

    assert!(env.wait().await.is_ok());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_go_after_cancel_never_runs() {
    pause();
    let env = Environment::new();
    let runs = counter();

    env.cancel(None);
    let task_runs = runs.clone();
    env.go(move |_| count_run(task_runs));

    assert!(env.wait().await.is_ok());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(env.outstanding(), 0);
}

#[tokio::test]
async fn test_task_token_is_cancelled_when_task_returns() {
    pause();
    let env = Environment::new();
    let (tx, rx) = tokio::sync::oneshot::channel();

    env.go(move |token| async move {
        let _ = tx.send(token.clone());
        Ok(())
    });

    let token = rx.await.unwrap();
    env.stop();
    assert!(env.wait().await.is_ok());
    assert!(token.is_cancelled());
    // A task's own token does not reach the root.
    assert!(!env.token().is_cancelled());
}

#[tokio::test]
async fn test_panicking_task_cancels_the_environment() {
    pause();
    let env = Environment::new();
    let exited = counter();

    let survivor = exited.clone();
    env.go(move |token| until_cancelled(token, survivor));
    env.go(|_| panic_after(Duration::from_millis(5)));

    let err = env.wait().await.unwrap_err();
    assert!(matches!(err, ShutdownError::Task(_)));
    assert!(err.to_string().contains("panicked"));
    assert_eq!(exited.load(Ordering::SeqCst), 1);
    assert_eq!(env.outstanding(), 0);
}

#[tokio::test]
async fn test_error_of_last_task_is_kept_after_stop() {
    pause();
    let env = Environment::new();

    env.go(|_| fail_after(Duration::from_millis(20), "late failure"));
    env.stop();

    let err = env.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "late failure");
}
