use std::sync::Arc;

use thiserror::Error;

pub type TaskError = anyhow::Error;

pub type TaskResult = Result<(), TaskError>;

/// The reason an environment shut down, as returned by `wait`.
///
/// Cloning is cheap: a task error is shared, so every caller of `wait`
/// observes the very same error.
#[derive(Debug, Clone, Error)]
pub enum ShutdownError {
    /// The process received SIGINT or SIGTERM.
    #[error("signaled")]
    Signaled,
    /// A supervised task returned an error (or panicked).
    #[error("{0:#}")]
    Task(Arc<TaskError>),
}

impl ShutdownError {
    /// Returns the task error, if the shutdown was caused by one.
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            Self::Signaled => None,
            Self::Task(err) => Some(err),
        }
    }
}

impl From<TaskError> for ShutdownError {
    fn from(err: TaskError) -> Self {
        Self::Task(Arc::new(err))
    }
}

/// Returns true if `err` records a shutdown triggered by SIGINT or SIGTERM
/// rather than by an application error.
pub fn is_signaled(err: &ShutdownError) -> bool {
    matches!(err, ShutdownError::Signaled)
}
