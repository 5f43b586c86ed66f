//! Termination signals to environment cancellation.
//!
//! On SIGINT or SIGTERM (Ctrl-C on non-unix platforms) the environment is
//! cancelled with [`ShutdownError::Signaled`] after a grace delay, which
//! leaves an external orchestrator time to drain in-flight work first.
//! The delay is read from [`CANCELLATION_DELAY_ENV`] when the signal arrives.

use std::{env, io, time::Duration};

use crate::{log::log_info, task::ShutdownError, Environment};

/// Name of the environment variable holding the grace delay, in seconds.
pub const CANCELLATION_DELAY_ENV: &str = "CANCELLATION_DELAY_SECONDS";

pub const DEFAULT_CANCELLATION_DELAY: Duration = Duration::from_secs(5);

/// Parses a grace delay given in whole seconds.
///
/// Missing, empty or unparsable values yield [`DEFAULT_CANCELLATION_DELAY`];
/// negative values are clamped to zero.
pub fn parse_delay_seconds(value: Option<&str>) -> Duration {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return DEFAULT_CANCELLATION_DELAY;
    };
    match value.parse::<i64>() {
        Ok(secs) if secs < 0 => Duration::ZERO,
        Ok(secs) => Duration::from_secs(secs.unsigned_abs()),
        Err(_) => DEFAULT_CANCELLATION_DELAY,
    }
}

/// Reads the grace delay from [`CANCELLATION_DELAY_ENV`].
pub fn cancellation_delay_from_env() -> Duration {
    let value = env::var(CANCELLATION_DELAY_ENV).ok();
    parse_delay_seconds(value.as_deref())
}

/// Cancels `env` once the process receives a termination signal.
///
/// The handlers are registered before this returns, so a signal delivered
/// afterwards cannot kill the process. The bridge then runs as a background
/// task that handles the first signal only. Its delay is not cancellable:
/// by then the process is already shutting down.
///
/// `delay` overrides [`CANCELLATION_DELAY_ENV`]. Fails when called outside a
/// Tokio runtime or when the handlers cannot be registered.
pub fn handle_signals(env: &Environment, delay: Option<Duration>) -> io::Result<()> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(io::Error::other("no tokio runtime to run the signal handler"));
    }
    let signaled = termination_signal()?;
    let env = env.clone();
    tokio::spawn(async move {
        let name = signaled.await;
        let delay = delay.unwrap_or_else(cancellation_delay_from_env);
        log_info!("received {name}, cancelling in {delay:?}");
        tokio::time::sleep(delay).await;
        env.cancel(Some(ShutdownError::Signaled));
    });
    Ok(())
}

/// Registers the termination handlers and returns a future resolving to
/// the name of the first signal received.
#[cfg(unix)]
fn termination_signal() -> io::Result<impl std::future::Future<Output = &'static str>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    })
}

#[cfg(not(unix))]
fn termination_signal() -> io::Result<impl std::future::Future<Output = &'static str>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        "Ctrl-C"
    })
}
