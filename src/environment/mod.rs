pub(crate) mod builder;
mod guard;

use std::{
    future::Future,
    pin::pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, OnceLock,
    },
};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::{
    log::{log_debug, log_info},
    task::{ShutdownError, TaskResult},
};
use guard::OutstandingGuard;

/// State shared by every clone of an [`Environment`].
#[derive(Debug)]
pub(crate) struct Shared {
    token: CancellationToken,
    stopped: AtomicBool,
    cancelled: AtomicBool,
    /// Written once by the caller that won the `cancelled` transition.
    /// `Some(None)` means "cancelled without error".
    error: OnceLock<Option<ShutdownError>>,
    outstanding: AtomicUsize,
    done: Notify,
}

impl Shared {
    /// `(stopped || cancelled) && outstanding == 0`.
    ///
    /// Cancellation only counts once its error is stored, so a waiter woken
    /// by a finishing task can never read an empty error slot.
    fn is_done(&self) -> bool {
        let shut_down = self.stopped.load(Ordering::SeqCst)
            || (self.cancelled.load(Ordering::SeqCst) && self.error.get().is_some());
        shut_down && self.outstanding.load(Ordering::SeqCst) == 0
    }

    fn notify_if_done(&self) {
        if self.is_done() {
            self.done.notify_waiters();
        }
    }
}

/// A cancellable environment for a group of tasks.
///
/// Every task started with [`go`](Self::go) receives a token derived from the
/// environment's root token. The first task that fails, or the first explicit
/// call to [`cancel`](Self::cancel), cancels the root token and with it every
/// running task. [`wait`](Self::wait) resolves once the environment has been
/// stopped or cancelled *and* every task has returned.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct Environment {
    shared: Arc<Shared>,
}

impl Environment {
    /// Creates an environment with a fresh root token.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Creates an environment whose root token is a child of `parent`.
    ///
    /// Cancelling `parent` cancels the tokens handed to this environment's
    /// tasks. It does not mark the environment itself as cancelled.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self::from_token(parent.child_token())
    }

    fn from_token(token: CancellationToken) -> Self {
        Self {
            shared: Arc::new(Shared {
                token,
                stopped: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                error: OnceLock::new(),
                outstanding: AtomicUsize::new(0),
                done: Notify::new(),
            }),
        }
    }

    /// Starts `f` as a supervised task.
    ///
    /// `f` receives a token derived from the root token; that token is
    /// cancelled when `f` returns. If `f` returns an error, the whole
    /// environment is cancelled with it.
    ///
    /// Once the environment is stopped or cancelled, `go` silently drops `f`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn go<F, Fut>(&self, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        // Register first, check second: a waiter that has seen zero
        // outstanding tasks after shutdown is then guaranteed that this
        // task will back out.
        let guard = OutstandingGuard::register(self.clone());
        if self.is_stopped() || self.is_cancelled() {
            log_debug!("environment is shutting down, task dropped");
            guard.abandon();
            return;
        }

        let token = self.shared.token.child_token();
        tokio::spawn(async move {
            let result = f(token.clone()).await;
            token.cancel();
            guard.finish(result);
        });
    }

    /// Cancels the root token and records `err` as the result of
    /// [`wait`](Self::wait).
    ///
    /// `cancel(None)` is valid: it cancels every task and makes `wait`
    /// return `Ok(())`. Only the first call has any effect; it returns true,
    /// every later call returns false.
    pub fn cancel(&self, err: Option<ShutdownError>) -> bool {
        if self
            .shared
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        match &err {
            Some(err) => log_info!("environment cancelled: {err}"),
            None => log_info!("environment cancelled"),
        }
        // Only the winner of the exchange above ever writes the slot.
        let _ = self.shared.error.set(err);
        self.shared.token.cancel();
        self.shared.notify_if_done();
        true
    }

    /// Declares that no further tasks will be started.
    ///
    /// Unlike [`cancel`](Self::cancel), running tasks keep their tokens
    /// alive and may run to completion.
    ///
    /// Calling `stop` is optional if `cancel` is guaranteed to be called at
    /// some point, for instance when the program runs until SIGINT or SIGTERM.
    pub fn stop(&self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        log_debug!("environment stopped");
        self.shared.notify_if_done();
    }

    /// Waits for [`stop`](Self::stop) or [`cancel`](Self::cancel), and for
    /// every task started by [`go`](Self::go) to return.
    ///
    /// Returns the error passed to the first `cancel`, or `Ok(())`. May be
    /// awaited any number of times, from any number of tasks.
    pub async fn wait(&self) -> Result<(), ShutdownError> {
        loop {
            let mut notified = pin!(self.shared.done.notified());
            // Enabled before the check so a concurrent notification is not lost.
            notified.as_mut().enable();
            if self.shared.is_done() {
                break;
            }
            notified.await;
        }

        match self.shared.error.get() {
            Some(Some(err)) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Returns a clone of the root token.
    ///
    /// Useful for servers that must shut down when the environment is
    /// cancelled but are not themselves started with `go`.
    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Number of tasks currently running.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
