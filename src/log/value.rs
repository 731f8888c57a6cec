use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::writer::Writer;

/// Failure while rendering an entry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A value's own rendering code panicked.
    #[error("PANIC={0}")]
    Panic(String),

    /// The destination refused the rendered entry.
    ///
    /// The writers and loggers in this crate never produce it; it is there
    /// for [`Writer`] and [`Logger`](super::Logger) implementations that
    /// deliver somewhere that can fail.
    #[error("{0}")]
    Sink(String),
}

/// Typed payload of a [`Field`](super::Field).
///
/// Each variant knows which [`Writer`] primitive it maps to, so writers can
/// pick their own encoding without knowing about the variants and values can
/// be rendered without knowing about the writer.
#[derive(Clone)]
pub enum Value {
    Int64(i64),
    String(String),
    /// Arbitrary structured data, rendered through its `Debug` form.
    Reflect(Arc<dyn fmt::Debug + Send + Sync>),
    /// Delegate rendered through its `Display` form. `None` renders `<nil>`.
    Stringer(Option<Arc<dyn fmt::Display + Send + Sync>>),
    /// Fault rendered through its message. `None` renders `<nil>`.
    Error(Option<Arc<dyn StdError + Send + Sync>>),
}

impl Value {
    /// Write the receiver to `w` using exactly one of its primitives.
    ///
    /// `Reflect`, `Stringer` and `Error` call into foreign code to produce
    /// their text. A panic there is caught and returned as
    /// [`WriteError::Panic`], and `w` sees nothing for this value. The panic
    /// hook still runs, so the default hook reports the panic on stderr.
    pub fn write(&self, w: &mut dyn Writer) -> Result<(), WriteError> {
        match self {
            Value::Int64(i) => w.int64(*i),
            Value::String(s) => w.string(s),
            Value::Reflect(r) => w.reflect(&render(Some(|| format!("{r:?}")))?),
            Value::Stringer(s) => w.string(&render(s.as_ref().map(|s| move || s.to_string()))?),
            Value::Error(e) => w.string(&render(e.as_ref().map(|e| move || e.to_string()))?),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(i) => f.debug_tuple("Int64").field(i).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Reflect(r) => f.debug_tuple("Reflect").field(r).finish(),
            Value::Stringer(Some(_)) => f.write_str("Stringer(..)"),
            Value::Error(Some(e)) => f.debug_tuple("Error").field(e).finish(),
            Value::Stringer(None) => f.write_str("Stringer(<nil>)"),
            Value::Error(None) => f.write_str("Error(<nil>)"),
        }
    }
}

pub(crate) const NIL: &str = "<nil>";

/// Output of `delegate`, `<nil>` when absent, with panics turned into errors.
pub(crate) fn render<F>(delegate: Option<F>) -> Result<String, WriteError>
where
    F: FnOnce() -> String,
{
    let Some(delegate) = delegate else {
        return Ok(NIL.to_string());
    };
    panic::catch_unwind(AssertUnwindSafe(delegate))
        .map_err(|payload| WriteError::Panic(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::writer::PlainWriter;

    struct Panicker(&'static str);

    impl fmt::Display for Panicker {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("{}", self.0)
        }
    }

    #[derive(Debug)]
    struct PanicError(&'static str);

    impl fmt::Display for PanicError {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("{}", self.0)
        }
    }

    impl StdError for PanicError {}

    struct BadDebug;

    impl fmt::Debug for BadDebug {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("oh, no!")
        }
    }

    #[derive(Debug)]
    struct Failed;

    impl fmt::Display for Failed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("abc")
        }
    }

    impl StdError for Failed {}

    fn written(v: &Value) -> (Result<(), WriteError>, String) {
        let mut w = PlainWriter::new();
        let result = v.write(&mut w);
        (result, w.into_string())
    }

    #[test]
    fn int64_writes_base_ten() {
        assert_eq!(written(&Value::Int64(1)), (Ok(()), "1".to_string()));
        assert_eq!(written(&Value::Int64(-42)), (Ok(()), "-42".to_string()));
    }

    #[test]
    fn string_writes_itself() {
        assert_eq!(written(&Value::String("abc".into())), (Ok(()), "abc".to_string()));
    }

    #[test]
    fn reflect_writes_debug_form() {
        let v = Value::Reflect(Arc::new(vec![1, 2, 3]));
        assert_eq!(written(&v), (Ok(()), "[1, 2, 3]".to_string()));
        let v = Value::Reflect(Arc::new("abc"));
        assert_eq!(written(&v), (Ok(()), "\"abc\"".to_string()));
    }

    #[test]
    fn panicking_reflect_fails_without_output() {
        let v = Value::Reflect(Arc::new(BadDebug));
        assert_eq!(
            written(&v),
            (Err(WriteError::Panic("oh, no!".into())), String::new())
        );
    }

    #[test]
    fn error_writes_message() {
        let v = Value::Error(Some(Arc::new(Failed)));
        assert_eq!(written(&v), (Ok(()), "abc".to_string()));
    }

    #[test]
    fn absent_error_writes_nil() {
        assert_eq!(written(&Value::Error(None)), (Ok(()), "<nil>".to_string()));
    }

    #[test]
    fn panicking_error_fails_without_output() {
        let v = Value::Error(Some(Arc::new(PanicError("boom"))));
        assert_eq!(
            written(&v),
            (Err(WriteError::Panic("boom".into())), String::new())
        );
    }

    #[test]
    fn stringer_cases() {
        assert_eq!(
            written(&Value::Stringer(Some(Arc::new("abc")))),
            (Ok(()), "abc".to_string())
        );
        assert_eq!(written(&Value::Stringer(None)), (Ok(()), "<nil>".to_string()));
        assert_eq!(
            written(&Value::Stringer(Some(Arc::new(Panicker("boom"))))),
            (Err(WriteError::Panic("boom".into())), String::new())
        );
    }

    #[test]
    fn panic_error_message_format() {
        assert_eq!(WriteError::Panic("oh, no!".into()).to_string(), "PANIC=oh, no!");
        assert_eq!(WriteError::Sink("refused".into()).to_string(), "refused");
    }
}
