use std::sync::{Arc, OnceLock};

use super::{Field, Logger, WriteError};

/// A logger that simply drops all entries.
///
/// Useful for silencing a sub-system, and for code paths under test that
/// don't care about logging. Since there is nothing to accumulate, `named`
/// and `with` hand back the receiver itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopLogger;

impl NopLogger {
    /// Process-wide shared instance.
    pub fn shared() -> Arc<NopLogger> {
        static SHARED: OnceLock<Arc<NopLogger>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(NopLogger)).clone()
    }
}

impl Logger for NopLogger {
    fn entry(&self, _message: &str, _fields: &[Field]) -> Result<(), WriteError> {
        Ok(())
    }

    fn named(self: Arc<Self>, _name: &str) -> Arc<dyn Logger> {
        self
    }

    fn with(self: Arc<Self>, _fields: Vec<Field>) -> Arc<dyn Logger> {
        self
    }
}
