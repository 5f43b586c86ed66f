//! Internal logging macros.
//!
//! `log_<level>!` forwards to the `tracing` macro of the same severity when the
//! `with_tracing` feature is enabled, and expands to nothing otherwise. The
//! arguments are still type-checked in the disabled case.

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(not(feature = "with_tracing"))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(not(feature = "with_tracing"))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(not(feature = "with_tracing"))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(not(feature = "with_tracing"))]
        let _ = format_args!($($arg)*);
    }};
}

pub(crate) use {log_debug, log_error, log_info, log_warn};
