//! The process-wide environment.
//!
//! Most programs need a single shutdown domain. This module holds one
//! [`Environment`] for the whole process, created on first use with
//! termination-signal handling and the SIGPIPE guard already wired in.
//! Call [`init`] at the top of `main`, inside the Tokio runtime, to do the
//! wiring before any other code runs.

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::{
    log::log_warn,
    pipe,
    signal,
    task::{ShutdownError, TaskResult},
    Environment,
};

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Returns the process-wide environment, creating it if needed.
///
/// The first call should happen inside a Tokio runtime; otherwise the
/// environment is created without signal handling.
pub fn environment() -> &'static Environment {
    ENVIRONMENT.get_or_init(|| {
        let env = Environment::new();
        if let Err(err) = signal::handle_signals(&env, None) {
            log_warn!("failed to install termination signal handler: {err}");
        }
        pipe::handle_sigpipe();
        env
    })
}

/// Creates the process-wide environment and wires its signal handling.
pub fn init() {
    environment();
}

/// Starts `f` in the process-wide environment.
///
/// See [`Environment::go`].
pub fn go<F, Fut>(f: F)
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = TaskResult> + Send + 'static,
{
    environment().go(f);
}

/// Declares that no further [`go`] will be called.
///
/// Optional if [`cancel`] is guaranteed to be called, for instance when the
/// program runs until SIGINT or SIGTERM.
pub fn stop() {
    environment().stop();
}

/// Cancels the process-wide environment. Returns true for the first caller.
///
/// See [`Environment::cancel`].
pub fn cancel(err: Option<ShutdownError>) -> bool {
    environment().cancel(err)
}

/// Waits for [`stop`] or [`cancel`], and for every task started by [`go`].
///
/// The error can be tested with [`is_signaled`](crate::is_signaled) to tell a
/// SIGINT/SIGTERM shutdown from an application failure.
pub async fn wait() -> Result<(), ShutdownError> {
    environment().wait().await
}

/// Root token of the process-wide environment.
pub fn token() -> CancellationToken {
    environment().token()
}
