use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use task_lifecycle::TaskResult;
use tokio_util::sync::CancellationToken;

// Waits for cancellation, lingers a little, then records its exit.
#[allow(unused)]
pub async fn until_cancelled(token: CancellationToken, exited: Arc<AtomicUsize>) -> TaskResult {
    token.cancelled().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    exited.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

// Ignores its own token and only returns once `gate` is released.
#[allow(unused)]
pub async fn until_released(gate: CancellationToken, finished: Arc<AtomicUsize>) -> TaskResult {
    gate.cancelled().await;
    finished.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

#[allow(unused)]
pub async fn fail_after(delay: Duration, message: &'static str) -> TaskResult {
    tokio::time::sleep(delay).await;
    Err(anyhow::anyhow!(message))
}

#[allow(unused)]
pub async fn count_run(counter: Arc<AtomicUsize>) -> TaskResult {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

#[allow(unused)]
pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

#[allow(unused)]
pub async fn panic_after(delay: Duration) -> TaskResult {
    tokio::time::sleep(delay).await;
    panic!("boom")
}
