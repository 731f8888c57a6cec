use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use super::value::{Value, WriteError};
use super::writer::Writer;

/// Labelled piece of meta-data attached to an entry or to a logger.
///
/// Labels are not required to be unique.
#[derive(Clone, Debug)]
pub struct Field {
    pub label: String,
    pub value: Value,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Field labelled `error` holding `err`.
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new("error", Value::Error(Some(Arc::new(err))))
    }

    /// Field labelled `error` holding an already shared fault, or none.
    pub fn shared_error(err: Option<Arc<dyn StdError + Send + Sync>>) -> Self {
        Self::new("error", Value::Error(err))
    }

    /// Any integer that fits in an `i64`.
    pub fn int(label: impl Into<String>, i: impl Into<i64>) -> Self {
        Self::new(label, Value::Int64(i.into()))
    }

    pub fn int64(label: impl Into<String>, i: i64) -> Self {
        Self::new(label, Value::Int64(i))
    }

    pub fn reflect<R>(label: impl Into<String>, r: R) -> Self
    where
        R: fmt::Debug + Send + Sync + 'static,
    {
        Self::new(label, Value::Reflect(Arc::new(r)))
    }

    pub fn string(label: impl Into<String>, s: impl Into<String>) -> Self {
        Self::new(label, Value::String(s.into()))
    }

    pub fn stringer<S>(label: impl Into<String>, s: S) -> Self
    where
        S: fmt::Display + Send + Sync + 'static,
    {
        Self::new(label, Value::Stringer(Some(Arc::new(s))))
    }

    /// Write the field to `w` through [`Writer::field`].
    pub fn write(&self, w: &mut dyn Writer) -> Result<(), WriteError> {
        w.field(&self.label, &|w| self.value.write(w))
    }
}
