use std::fmt;
use std::sync::Arc;

use super::record::LogRecord;
use super::{Field, Logger, WriteError};
use crate::time::{Clock, SystemClock};

/// [`Logger`] that delegates to the `tracing` ecosystem.
///
/// Every entry becomes one `INFO` event carrying the message, the dotted
/// logger name as `logger`, and the fields as a JSON object in `fields`.
/// Fields are mapped by variant (see [`json_value`](super::record::json_value)):
/// integers stay numbers, everything else becomes a string.
///
/// Unlike [`TestingLogger`](super::TestingLogger), names and fields are
/// accumulated eagerly, the way a structured backend carries its context.
/// Rendering failures are returned to the caller as is.
///
/// Install a subscriber with [`init_tracing`](crate::init::init_tracing) to
/// see the events.
#[derive(Clone)]
pub struct TracingLogger {
    name: String,
    fields: Vec<Field>,
    clock: Arc<dyn Clock>,
}

impl TracingLogger {
    pub fn new() -> Arc<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Logger timestamping its records with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            name: String::new(),
            fields: Vec::new(),
            clock,
        })
    }

    /// The record `entry` would emit for `message` and `fields`.
    pub fn record(&self, message: &str, fields: &[Field]) -> Result<LogRecord, WriteError> {
        LogRecord::new(
            self.clock.now(),
            &self.name,
            message,
            self.fields.iter().chain(fields),
        )
    }
}

impl Logger for TracingLogger {
    fn entry(&self, message: &str, fields: &[Field]) -> Result<(), WriteError> {
        let record = self.record(message, fields)?;
        let at = record.timestamp.to_rfc3339();
        match &record.logger {
            Some(logger) => tracing::info!(
                logger = %logger,
                fields = %record.fields_json(),
                at = %at,
                "{}",
                record.message
            ),
            None => tracing::info!(
                fields = %record.fields_json(),
                at = %at,
                "{}",
                record.message
            ),
        }
        Ok(())
    }

    fn named(self: Arc<Self>, name: &str) -> Arc<dyn Logger> {
        if name.is_empty() {
            return self;
        }
        let mut child = (*self).clone();
        child.name = if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.name, name)
        };
        Arc::new(child)
    }

    fn with(self: Arc<Self>, fields: Vec<Field>) -> Arc<dyn Logger> {
        if fields.is_empty() {
            return self;
        }
        let mut child = (*self).clone();
        child.fields.extend(fields);
        Arc::new(child)
    }
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use chrono_tz::Tz;
    use std::io;
    use std::sync::Mutex;

    fn stopped() -> Arc<TracingLogger> {
        let at: DateTime<Tz> = Tz::UTC.with_ymd_and_hms(2022, 3, 9, 19, 51, 0).unwrap();
        TracingLogger::with_clock(Arc::new(move || at))
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn entry_emits_message_name_and_fields() {
        let logger: Arc<dyn Logger> = stopped();
        let out = capture(|| {
            logger
                .named("a")
                .with(vec![Field::int64("ID", 1)])
                .entry("bc", &[Field::string("name", "x")])
                .unwrap();
        });
        assert!(out.contains("INFO"), "{out}");
        assert!(out.contains("bc"), "{out}");
        assert!(out.contains("logger=a"), "{out}");
        assert!(out.contains(r#"fields={"ID":1,"name":"x"}"#), "{out}");
        assert!(out.contains("at=2022-03-09T19:51:00+00:00"), "{out}");
    }

    #[test]
    fn names_join_with_periods() {
        let logger: Arc<dyn Logger> = stopped();
        let out = capture(|| {
            logger.named("a").named("").named("b").entry("c", &[]).unwrap();
        });
        assert!(out.contains("logger=a.b"), "{out}");
    }

    #[test]
    fn record_orders_logger_fields_before_entry_fields() {
        let mut logger = (*stopped()).clone();
        logger.name = "svc".into();
        logger.fields = vec![Field::int64("a", 1), Field::int64("b", 2)];
        let record = logger.record("c", &[Field::int64("d", 3)]).unwrap();
        assert_eq!(record.logger.as_deref(), Some("svc"));
        assert_eq!(record.message, "c");
        assert_eq!(record.fields_json(), r#"{"a":1,"b":2,"d":3}"#);
    }

    #[test]
    fn empty_derivations_return_receiver() {
        let logger: Arc<dyn Logger> = stopped();
        assert!(Arc::ptr_eq(&logger, &logger.clone().named("")));
        assert!(Arc::ptr_eq(&logger, &logger.clone().with(Vec::new())));
    }

    #[test]
    fn panicking_stringer_is_returned_to_caller() {
        struct Panicker;
        impl fmt::Display for Panicker {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("oh, no!")
            }
        }
        let logger = stopped();
        assert_eq!(
            logger.entry("abc", &[Field::stringer("s", Panicker)]),
            Err(WriteError::Panic("oh, no!".into()))
        );
    }
}
