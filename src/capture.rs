//! Output capture for guarded checks
//!
//! A guarded check does not write to the process streams. It is handed a
//! [`Capture`] sink instead, and whatever it writes there is collected and
//! later re-emitted as diagnostics. The sink lives only for the duration of
//! the call, so nothing has to be restored afterwards, and two checks running
//! at the same time never see each other's output.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};

/// In-memory sink passed to a guarded check.
///
/// Implements both [`io::Write`] and [`fmt::Write`], so `write!` and
/// `writeln!` work either way, and it can be handed to code that takes a
/// generic writer.
#[derive(Debug, Default)]
pub struct Capture {
    buf: Vec<u8>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw captured bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Captured text, decoded lossily as UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    /// Non-empty lines of the captured text
    pub fn lines(&self) -> Vec<String> {
        self.text()
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for Capture {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// How a guarded check ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The check returned normally with this verdict
    Completed(bool),
    /// The check panicked; carries the panic message
    Panicked(String),
}

impl Outcome {
    /// A panic always counts as a failure.
    pub fn passed(&self) -> bool {
        matches!(self, Outcome::Completed(true))
    }
}

/// Run `f` against a fresh [`Capture`], converting a panic into
/// [`Outcome::Panicked`]. The captured bytes are returned on every path.
pub fn capture<F>(f: F) -> (Outcome, Capture)
where
    F: FnOnce(&mut Capture) -> bool,
{
    let mut sink = Capture::new();
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut sink))) {
        Ok(verdict) => Outcome::Completed(verdict),
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    };
    (outcome, sink)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
