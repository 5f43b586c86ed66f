use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{log::log_warn, pipe, signal, Environment};

/// Builds an [`Environment`] with optional process-wide wiring.
///
/// By default the built environment has no side effects on the process: no
/// signal handler is installed and SIGPIPE is left alone.
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    parent: Option<CancellationToken>,
    cancellation_delay: Option<Duration>,
    handle_signals: bool,
    guard_sigpipe: bool,
}

impl EnvironmentBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the environment's root token from `parent`.
    pub fn with_parent_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets a fixed delay between a termination signal and the cancellation.
    ///
    /// Without it, the delay is read from `CANCELLATION_DELAY_SECONDS` when
    /// the signal arrives.
    pub fn with_cancellation_delay(mut self, delay: Duration) -> Self {
        self.cancellation_delay = Some(delay);
        self
    }

    /// Cancels the environment on SIGINT or SIGTERM.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Swallows SIGPIPE when the process runs as a systemd service.
    pub fn with_pipe_guard(mut self, enabled: bool) -> Self {
        self.guard_sigpipe = enabled;
        self
    }

    /// Constructs the `Environment` with the configured settings.
    ///
    /// Signal handling requires a Tokio runtime; if the handler cannot be
    /// registered the environment is still returned, without signal handling.
    pub fn build(self) -> Environment {
        let env = match &self.parent {
            Some(parent) => Environment::with_parent(parent),
            None => Environment::new(),
        };

        if self.handle_signals {
            if let Err(err) = signal::handle_signals(&env, self.cancellation_delay) {
                log_warn!("failed to install termination signal handler: {err}");
            }
        }
        if self.guard_sigpipe {
            pipe::handle_sigpipe();
        }
        env
    }
}
