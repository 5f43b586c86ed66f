use std::sync::atomic::Ordering;

use crate::{
    log::{log_error, log_warn},
    task::TaskResult,
    Environment,
};

/// One slot of an environment's outstanding-task count.
///
/// The slot is taken on `register` and released on drop, so the count stays
/// balanced even when the task future panics or is dropped by the runtime.
/// A task that never reaches [`finish`](Self::finish) other than through
/// [`abandon`](Self::abandon) is treated as failed.
#[derive(Debug)]
pub(crate) struct OutstandingGuard {
    env: Environment,
    settled: bool,
}

impl OutstandingGuard {
    pub(crate) fn register(env: Environment) -> Self {
        env.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        Self {
            env,
            settled: false,
        }
    }

    /// Releases the slot of a task that was never started.
    pub(crate) fn abandon(mut self) {
        self.settled = true;
    }

    /// Releases the slot of a task that returned `result`.
    ///
    /// A failure cancels the environment before the slot is released, so the
    /// error is stored by the time a waiter can observe zero outstanding tasks.
    pub(crate) fn finish(mut self, result: TaskResult) {
        self.settled = true;
        if let Err(err) = result {
            log_warn!("task failed: {err:#}");
            self.env.cancel(Some(err.into()));
        }
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        if !self.settled {
            log_error!("task dropped before completion (panicked or aborted)");
            self.env.cancel(Some(
                anyhow::anyhow!("task panicked or was aborted before completion").into(),
            ));
        }
        let shared = &self.env.shared;
        shared.outstanding.fetch_sub(1, Ordering::SeqCst);
        shared.notify_if_done();
    }
}
