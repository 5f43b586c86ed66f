//! # task-lifecycle
//!
//! `task-lifecycle` runs Tokio tasks in a shared, cancellable environment and
//! makes sure every one of them has returned before the program exits.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use task_lifecycle::{global, is_signaled, TaskResult};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn worker(token: CancellationToken) -> TaskResult {
//!     loop {
//!         tokio::select! {
//!             _ = token.cancelled() => return Ok(()),
//!             _ = tokio::time::sleep(Duration::from_secs(1)) => println!("tick"),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     global::init();
//!     global::go(worker);
//!
//!     // Runs until SIGINT/SIGTERM or until a task fails.
//!     match global::wait().await {
//!         Ok(()) => {}
//!         Err(err) if is_signaled(&err) => {}
//!         Err(err) => {
//!             eprintln!("{err}");
//!             std::process::exit(1);
//!         }
//!     }
//! }
//! ```
//!
//! ## What you get
//!
//! * **One failure stops everything** – the first task error cancels every other task.
//! * **No lost tasks** – `wait` returns only once every started task has returned.
//! * **Signal-driven shutdown** – SIGINT/SIGTERM cancel the environment after a
//!   grace delay (`CANCELLATION_DELAY_SECONDS`, 5 s by default).
//! * **systemd friendly** – SIGPIPE is swallowed when running as a systemd service,
//!   so a journald restart no longer kills the process.
//!
//! ## API overview
//!
//! | Environment method | Purpose                                                  |
//! | ------------------ | -------------------------------------------------------- |
//! | `go(f)`            | Start a task with a token derived from the root token    |
//! | `cancel(err)`      | Cancel every task; `err` becomes the result of `wait`    |
//! | `stop()`           | Refuse new tasks, let running ones finish                |
//! | `wait().await`     | Wait for stop/cancel and for all tasks to return         |
//!
//! The same operations exist as free functions in [`global`], backed by a
//! single process-wide environment.

pub use environment::{builder::EnvironmentBuilder, Environment};
pub use task::{is_signaled, ShutdownError, TaskError, TaskResult};

mod environment;
pub mod global;
mod log;
pub mod pipe;
pub mod signal;
mod task;
