//! Environment variable names read by [`LogConfig::from_env`](crate::init::LogConfig::from_env).
//!
//! These are purely helpers; nothing else in the crate touches the
//! environment.

/// Filter directives for the `tracing` subscriber, e.g. `info,ctxkit=debug`.
pub const CTXKIT_LOG_ENV: &str = "CTXKIT_LOG";

/// `true` or `false`: color the console output.
pub const CTXKIT_LOG_ANSI_ENV: &str = "CTXKIT_LOG_ANSI";

/// `true` or `false`: print the event target.
pub const CTXKIT_LOG_TARGET_ENV: &str = "CTXKIT_LOG_TARGET";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
