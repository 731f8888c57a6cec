use super::value::WriteError;

/// Callback that writes one field's value.
pub type WriteValue<'a> = &'a dyn Fn(&mut dyn Writer) -> Result<(), WriteError>;

/// Target of typed data.
///
/// Together with [`Value::write`](super::Value::write) this forms a double
/// dispatch: a value picks the primitive matching its type, the writer picks
/// the encoding.
pub trait Writer {
    /// Write an integer.
    fn int64(&mut self, i: i64) -> Result<(), WriteError>;

    /// Write arbitrary data, given as its already rendered `Debug` form.
    fn reflect(&mut self, debug: &str) -> Result<(), WriteError>;

    /// Write a string.
    fn string(&mut self, s: &str) -> Result<(), WriteError>;

    /// Write `label`, then call `value` to write the field's value.
    ///
    /// Taking a callback lets the writer do any bookkeeping (separators,
    /// indentation) around whatever the value ends up writing.
    fn field(&mut self, label: &str, value: WriteValue<'_>) -> Result<(), WriteError>;
}

/// Single-line [`Writer`]: `label: value` pairs joined by `"; "`, sibling
/// values joined by `", "`.
#[derive(Debug, Default, Clone)]
pub struct PlainWriter {
    buf: String,
    separate: bool,
}

impl PlainWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn separator(&mut self) {
        if self.separate {
            self.buf.push_str(", ");
        } else {
            self.separate = true;
        }
    }
}

impl Writer for PlainWriter {
    fn int64(&mut self, i: i64) -> Result<(), WriteError> {
        self.separator();
        self.buf.push_str(&i.to_string());
        Ok(())
    }

    fn reflect(&mut self, debug: &str) -> Result<(), WriteError> {
        self.string(debug)
    }

    fn string(&mut self, s: &str) -> Result<(), WriteError> {
        self.separator();
        self.buf.push_str(s);
        Ok(())
    }

    fn field(&mut self, label: &str, value: WriteValue<'_>) -> Result<(), WriteError> {
        if self.separate {
            self.buf.push_str("; ");
        }
        self.buf.push_str(label);
        self.buf.push_str(": ");
        self.separate = false;
        value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_are_comma_separated() {
        let mut w = PlainWriter::new();
        w.string("a").unwrap();
        w.int64(1).unwrap();
        w.reflect(&format!("{:?}", Some(2))).unwrap();
        assert_eq!(w.as_str(), "a, 1, Some(2)");
    }

    #[test]
    fn fields_are_semicolon_separated() {
        let mut w = PlainWriter::new();
        w.field("a", &|w| w.int64(1)).unwrap();
        w.field("b", &|w| {
            w.string("x")?;
            w.string("y")
        })
        .unwrap();
        assert_eq!(w.as_str(), "a: 1; b: x, y");
    }

    #[test]
    fn field_propagates_value_error() {
        let mut w = PlainWriter::new();
        let err = w
            .field("a", &|_| Err(WriteError::Panic("boom".into())))
            .unwrap_err();
        assert_eq!(err, WriteError::Panic("boom".into()));
        assert_eq!(w.as_str(), "a: ");
    }
}
