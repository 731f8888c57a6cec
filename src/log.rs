//! Minimal structured logging.
//!
//! A [`Logger`] creates entries from a message plus [`Field`]s, and derives
//! new loggers with an extra name segment ([`Logger::named`]) or extra fields
//! ([`Logger::with`]). A field is a label and a typed [`Value`]; values write
//! themselves to a [`Writer`], and the logger owning the writer decides how
//! everything ends up formatted. There are no severity levels; a field can
//! carry one if a caller wants it.
//!
//! Loggers travel in a [`Context`]. [`nop`], [`testing`] and [`using`]
//! install one, [`current`] fetches it, and [`entry`], [`named`] and [`with`]
//! work on it directly.
//!
//! ```
//! use std::sync::Arc;
//! use ctxkit::context::Context;
//! use ctxkit::log::{self, Field};
//! use ctxkit::testing::Recorder;
//!
//! let recorder = Arc::new(Recorder::new());
//! let ctx = log::testing(&Context::background(), recorder.clone());
//! let ctx = log::named(&ctx, "db");
//! log::entry(&ctx, "connected", &[Field::int64("pool", 4)]).unwrap();
//! assert_eq!(recorder.logs(), vec!["db: connected\npool: 4"]);
//! ```

use std::sync::Arc;

use crate::context::{Context, Key};
use crate::testing::T;

pub mod backend;
pub mod field;
pub mod nop;
pub mod record;
pub mod test_logger;
pub mod value;
pub mod writer;

pub use backend::TracingLogger;
pub use field::Field;
pub use nop::NopLogger;
pub use record::LogRecord;
pub use test_logger::TestingLogger;
pub use value::{Value, WriteError};
pub use writer::{PlainWriter, Writer};

/// Structured logger.
pub trait Logger: Send + Sync {
    /// Add an entry consisting of `message` and `fields`.
    ///
    /// Errors if the entry couldn't be rendered or delivered.
    fn entry(&self, message: &str, fields: &[Field]) -> Result<(), WriteError>;

    /// A logger with `name` appended to the receiver's name.
    ///
    /// Returns the receiver if `name` is empty. Otherwise the new name is
    /// `name` when the receiver has none, or the receiver's name, a period
    /// and `name`.
    fn named(self: Arc<Self>, name: &str) -> Arc<dyn Logger>;

    /// A logger whose entries also carry `fields`, after the receiver's.
    ///
    /// Returns the receiver if `fields` is empty.
    fn with(self: Arc<Self>, fields: Vec<Field>) -> Arc<dyn Logger>;
}

/// [`Context`] key of the active [`Logger`].
pub struct LoggerKey;

impl Key for LoggerKey {
    type Value = Arc<dyn Logger>;
    const NAME: &'static str = "Logger";
}

/// `ctx` with a logger that discards everything.
pub fn nop(ctx: &Context) -> Context {
    using(ctx, NopLogger::shared())
}

/// `ctx` with a [`TestingLogger`] reporting to `t`.
pub fn testing(ctx: &Context, t: Arc<dyn T>) -> Context {
    using(ctx, TestingLogger::new(t))
}

/// `ctx` with `logger` as the active logger.
pub fn using(ctx: &Context, logger: Arc<dyn Logger>) -> Context {
    ctx.with_value::<LoggerKey>(logger)
}

/// The logger installed in `ctx`.
///
/// # Panics
///
/// If no logger was installed with [`nop`], [`testing`] or [`using`].
#[track_caller]
pub fn current(ctx: &Context) -> Arc<dyn Logger> {
    Arc::clone(ctx.expect_value::<LoggerKey>())
}

/// Add an entry to the logger in `ctx`.
#[track_caller]
pub fn entry(ctx: &Context, message: &str, fields: &[Field]) -> Result<(), WriteError> {
    ctx.expect_value::<LoggerKey>().entry(message, fields)
}

/// `ctx` with its logger named `name`, see [`Logger::named`].
#[track_caller]
pub fn named(ctx: &Context, name: &str) -> Context {
    using(ctx, current(ctx).named(name))
}

/// `ctx` with `fields` added to its logger, see [`Logger::with`].
#[track_caller]
pub fn with(ctx: &Context, fields: Vec<Field>) -> Context {
    using(ctx, current(ctx).with(fields))
}
