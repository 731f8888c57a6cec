//! Context-scoped structured logging, clocks and HTTP helpers.
//!
//! Everything a request needs from its surroundings travels in an immutable
//! [`Context`](context::Context): the [`log::Logger`] to write entries to,
//! the [`time::Clock`] to ask for the current time, and (with the `net`
//! feature) the [`http::Transport`] that sends requests. Tests swap each of
//! them out without touching the code under test.

pub mod context;
pub mod env;
pub mod init;
pub mod json;
pub mod log;
pub mod testing;
pub mod time;

#[cfg(feature = "net")]
pub mod http;
#[cfg(feature = "net")]
pub mod httptest;
