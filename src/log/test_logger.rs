use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::writer::{WriteValue, Writer};
use super::{Field, Logger, WriteError};
use crate::testing::T;

/// Logger for use in tests, reporting through a [`T`].
///
/// An entry is formatted as `[NAME ": "] MESSAGE` followed by one
/// `"\n" LABEL ": " VALUE` line per field: first the fields added to the
/// logger (outermost first), then the ones passed to `entry`.
///
/// * integers are written in base ten with a leading `-` when negative;
/// * reflected values are written as the string `format!("{:?}", value)`;
/// * strings are written as is, except that a line feed is followed by
///   enough spaces to line up with the start of the value (`len(LABEL) + 2`)
///   and any other character below U+0020 is replaced by its control
///   picture, U+2400 + the character.
///
/// If rendering fails, `"write error: "` plus the error is logged instead
/// and the test is marked as failed. `entry` itself never errors.
///
/// Each derived logger is one link in a chain that only holds its own name
/// segment and fields; the parent is shared, never copied.
pub struct TestingLogger {
    t: Arc<dyn T>,
    name: String,
    fields: Vec<Field>,
    parent: Option<Arc<TestingLogger>>,
}

impl TestingLogger {
    pub fn new(t: Arc<dyn T>) -> Arc<Self> {
        Arc::new(Self {
            t,
            name: String::new(),
            fields: Vec::new(),
            parent: None,
        })
    }

    fn child(self: Arc<Self>, name: String, fields: Vec<Field>) -> Arc<Self> {
        Arc::new(Self {
            t: Arc::clone(&self.t),
            name,
            fields,
            parent: Some(self),
        })
    }

    fn render(&self, w: &mut TestingWriter, message: &str, fields: &[Field]) -> Result<(), WriteError> {
        if self.render_name(w) {
            w.push_str(": ");
        }
        w.push_escaped(message);
        self.render_fields(w)?;
        fields.iter().try_for_each(|f| f.write(w))
    }

    /// Dotted name, outermost segment first. True if anything was written.
    fn render_name(&self, w: &mut TestingWriter) -> bool {
        let parent_wrote = self.parent.as_ref().is_some_and(|p| p.render_name(w));
        if self.name.is_empty() {
            return parent_wrote;
        }
        if parent_wrote {
            w.push_str(".");
        }
        w.push_escaped(&self.name);
        true
    }

    fn render_fields(&self, w: &mut TestingWriter) -> Result<(), WriteError> {
        if let Some(parent) = &self.parent {
            parent.render_fields(w)?;
        }
        self.fields.iter().try_for_each(|f| f.write(w))
    }
}

impl Logger for TestingLogger {
    fn entry(&self, message: &str, fields: &[Field]) -> Result<(), WriteError> {
        self.t.helper();

        let mut w = PooledWriter::acquire();
        match self.render(&mut w, message, fields) {
            Ok(()) => self.t.log(w.as_str()),
            Err(err) => {
                self.t.log(&format!("write error: {err}"));
                self.t.fail();
            }
        }
        Ok(())
    }

    fn named(self: Arc<Self>, name: &str) -> Arc<dyn Logger> {
        if name.is_empty() {
            return self;
        }
        self.child(name.to_string(), Vec::new())
    }

    fn with(self: Arc<Self>, fields: Vec<Field>) -> Arc<dyn Logger> {
        if fields.is_empty() {
            return self;
        }
        self.child(String::new(), fields)
    }
}

impl fmt::Debug for TestingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestingLogger")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

/// Scratch state for rendering one entry.
#[derive(Debug, Default)]
struct TestingWriter {
    buf: String,
    indentation: usize,
    separate: bool,
}

impl TestingWriter {
    fn reset(&mut self) {
        self.buf.clear();
        self.indentation = 0;
        self.separate = false;
    }

    fn as_str(&self) -> &str {
        &self.buf
    }

    fn separator(&mut self) {
        if self.separate {
            self.buf.push_str(", ");
        } else {
            self.separate = true;
        }
    }

    fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn push_escaped(&mut self, s: &str) {
        let mut start = 0;
        for (i, c) in s.char_indices() {
            if c >= '\u{20}' {
                continue;
            }
            self.buf.push_str(&s[start..i]);
            start = i + c.len_utf8();
            if c == '\n' {
                self.line_feed();
            } else if let Some(picture) = char::from_u32(0x2400 + c as u32) {
                self.buf.push(picture);
            }
        }
        self.buf.push_str(&s[start..]);
    }

    fn line_feed(&mut self) {
        self.buf.push('\n');
        self.buf.extend(std::iter::repeat(' ').take(self.indentation));
    }
}

impl Writer for TestingWriter {
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
        self.push_escaped(s);
        Ok(())
    }

    fn field(&mut self, label: &str, value: WriteValue<'_>) -> Result<(), WriteError> {
        self.line_feed();
        self.push_escaped(label);
        self.push_str(": ");
        self.separate = false;
        let n = label.len() + 2;
        self.indentation += n;
        let result = value(self);
        self.indentation -= n;
        result
    }
}

const POOL_CAPACITY: usize = 8;
const MAX_POOLED_BYTES: usize = 64 * 1024;

thread_local! {
    static WRITERS: RefCell<Vec<TestingWriter>> = const { RefCell::new(Vec::new()) };
}

/// A [`TestingWriter`] taken from the calling thread's free list.
///
/// The writer is reset when taken and again when the guard drops, whichever
/// way the entry ends, and then goes back to the free list.
struct PooledWriter {
    writer: Option<TestingWriter>,
}

impl PooledWriter {
    fn acquire() -> Self {
        let mut writer = WRITERS
            .try_with(|pool| pool.borrow_mut().pop())
            .ok()
            .flatten()
            .unwrap_or_else(|| TestingWriter {
                buf: String::with_capacity(1024),
                ..TestingWriter::default()
            });
        writer.reset();
        Self {
            writer: Some(writer),
        }
    }
}

impl Deref for PooledWriter {
    type Target = TestingWriter;

    fn deref(&self) -> &TestingWriter {
        self.writer.as_ref().unwrap_or_else(|| unreachable!("writer taken before drop"))
    }
}

impl DerefMut for PooledWriter {
    fn deref_mut(&mut self) -> &mut TestingWriter {
        self.writer.as_mut().unwrap_or_else(|| unreachable!("writer taken before drop"))
    }
}

impl Drop for PooledWriter {
    fn drop(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        writer.reset();
        if writer.buf.capacity() > MAX_POOLED_BYTES {
            return;
        }
        // The free list is gone during thread teardown; the writer is just dropped then.
        let _ = WRITERS.try_with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOL_CAPACITY {
                pool.push(writer);
            }
        });
    }
}
