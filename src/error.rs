//! Reporter errors
//!
//! Assertion outcomes are plain booleans. These errors only cover the output
//! sink and configuration.

use std::fmt;
use std::path::PathBuf;

/// The kind of reporter error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Writing or flushing the TAP output failed
    Io,
    /// A configuration value could not be parsed
    Config,
}

/// An error raised outside of assertion results
#[derive(Debug)]
pub struct TapError {
    pub kind: ErrorKind,
    pub message: String,
    pub path: Option<PathBuf>,
}

impl TapError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn is_io(&self) -> bool {
        self.kind == ErrorKind::Io
    }
}

impl fmt::Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: ", path.display())?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TapError {}

impl From<std::io::Error> for TapError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}
