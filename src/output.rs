//! TAP output sink
//!
//! A cloneable handle to the single text stream a run writes to. The root
//! scope and every subtest share the same handle, so lines from all scopes
//! land in one stream in the order they were written.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TapError;

struct Sink {
    writer: Box<dyn Write + Send>,
    /// First write failure. Once set, further lines are dropped.
    error: Option<io::Error>,
}

/// Shared destination for TAP lines
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    /// Write to the process standard output
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Create (or truncate) a file and write to it
    pub fn file(path: impl AsRef<Path>) -> Result<Self, TapError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TapError::from(e).with_path(path))?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Write to an arbitrary writer
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink {
                writer: Box::new(writer),
                error: None,
            })),
        }
    }

    /// Write one `<indent><text>\n` line and flush it.
    pub(crate) fn line(&self, indent: &str, text: fmt::Arguments<'_>) {
        let mut sink = self.lock();
        if sink.error.is_some() {
            return;
        }
        let result = writeln!(sink.writer, "{}{}", indent, text).and_then(|()| sink.writer.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "TAP output failed; dropping further lines");
            sink.error = Some(e);
        }
    }

    /// Flush the underlying writer, reporting any earlier write failure.
    pub fn finish(&self) -> Result<(), TapError> {
        let mut sink = self.lock();
        if let Some(e) = sink.error.take() {
            return Err(e.into());
        }
        sink.writer.flush()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// In-memory writer whose clones all see the same bytes.
///
/// Handy for embedding a run inside another program, and for tests:
///
/// ```rust
/// use tap_reporter::{Output, SharedBuffer};
///
/// let buf = SharedBuffer::new();
/// let ok = tap_reporter::builder()
///     .output(Output::from_writer(buf.clone()))
///     .run(|t| {
///         t.pass("works");
///     });
/// assert!(ok);
/// assert_eq!(buf.contents(), "1..0\nok 1 - works\n");
/// ```
#[derive(Clone, Default, Debug)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily as UTF-8
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Everything written so far, split into lines
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
