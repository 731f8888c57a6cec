//! Test-reporting sink used by the test-oriented helpers in this crate.
//!
//! [`T`] is the small slice of a test harness that helpers need: logging a
//! line, marking the test as failed, stopping it, and flagging a helper frame.
//! [`Recorder`] captures every call so helpers can themselves be tested, and
//! [`Harness`] forwards to libtest for use in ordinary `#[test]` functions.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Reporting surface of a running test.
pub trait T: Send + Sync {
    /// Mark the test as failed and keep going.
    fn fail(&self);

    /// Report `message` and stop the test.
    fn fatal(&self, message: &str) -> !;

    /// Mark the calling function as a test helper.
    fn helper(&self);

    /// Add `line` to the test's log output.
    fn log(&self, line: &str);
}

/// Everything a [`Recorder`] has seen so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recorded {
    /// `fail` was called.
    pub failed: bool,
    /// `fatal` was called.
    pub was_fatal: bool,
    /// The message `fatal` was called with.
    pub fatal_message: Option<String>,
    /// Number of `helper` calls.
    pub calls_to_helper: usize,
    /// Lines passed to `log`, in order.
    pub logs: Vec<String>,
}

/// [`T`] that records every call.
///
/// Code that may call [`T::fatal`] should run inside [`Recorder::exec`].
#[derive(Debug, Default)]
pub struct Recorder {
    state: Mutex<Recorded>,
}

/// Panic payload used by [`Recorder::fatal`] so `exec` can tell it apart.
struct FatalUnwind;

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Recorded {
        self.state().clone()
    }

    pub fn failed(&self) -> bool {
        self.state().failed
    }

    pub fn was_fatal(&self) -> bool {
        self.state().was_fatal
    }

    pub fn calls_to_helper(&self) -> usize {
        self.state().calls_to_helper
    }

    pub fn logs(&self) -> Vec<String> {
        self.state().logs.clone()
    }

    /// Run `possibly_fatal`, swallowing the unwind started by
    /// [`Recorder::fatal`]. Any other panic keeps unwinding.
    pub fn exec<F: FnOnce()>(&self, possibly_fatal: F) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(possibly_fatal)) {
            if !(payload.is::<FatalUnwind>() && self.was_fatal()) {
                panic::resume_unwind(payload);
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl T for Recorder {
    fn fail(&self) {
        self.state().failed = true;
    }

    fn fatal(&self, message: &str) -> ! {
        {
            let mut state = self.state();
            state.was_fatal = true;
            state.fatal_message = Some(message.to_string());
        }
        panic::resume_unwind(Box::new(FatalUnwind))
    }

    fn helper(&self) {
        self.state().calls_to_helper += 1;
    }

    fn log(&self, line: &str) {
        self.state().logs.push(line.to_string());
    }
}

/// [`T`] for plain libtest tests.
///
/// Log lines go to stdout, which libtest captures and only shows for failing
/// tests (or with `--nocapture`). A harness marked as failed panics when it
/// is dropped, failing the surrounding test after it has run to completion.
#[derive(Debug)]
pub struct Harness {
    name: String,
    failed: AtomicBool,
}

impl Harness {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: AtomicBool::new(false),
        }
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

impl T for Harness {
    fn fail(&self) {
        self.failed.store(true, Ordering::Relaxed);
    }

    fn fatal(&self, message: &str) -> ! {
        panic!("{}: {}", self.name, message)
    }

    // libtest attributes locations through #[track_caller]; nothing to do.
    fn helper(&self) {}

    fn log(&self, line: &str) {
        println!("{}: {}", self.name, line);
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if self.failed() && !std::thread::panicking() {
            panic!("{} was marked as failed", self.name);
        }
    }
}
