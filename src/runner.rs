//! Test runner
//!
//! Creates the root scope, runs the caller's test body against it, and turns
//! the root summary into the overall verdict.

use std::path::PathBuf;

use tracing::debug;

use crate::error::TapError;
use crate::output::Output;
use crate::reporter::Reporter;

/// Written before anything else when `version_header` is set
const VERSION_LINE: &str = "TAP version 14";

/// Configuration for a run
#[derive(Debug, Default)]
pub struct RunConfig {
    /// Where TAP lines are written
    pub output: Output,
    /// Start the stream with a `TAP version 14` line
    pub version_header: bool,
}

impl RunConfig {
    /// Build a config from the environment.
    ///
    /// - `TAP_OUTPUT`: write TAP to this file instead of stdout
    /// - `TAP_VERSION_HEADER`: `1`/`true`/`yes`/`on` to emit the version line
    pub fn from_env() -> Result<Self, TapError> {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os("TAP_OUTPUT") {
            if !path.is_empty() {
                config.output = Output::file(PathBuf::from(path))?;
            }
        }

        if let Ok(value) = std::env::var("TAP_VERSION_HEADER") {
            config.version_header = parse_flag(&value).ok_or_else(|| {
                TapError::config(format!(
                    "TAP_VERSION_HEADER: expected a boolean, got {:?}",
                    value
                ))
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Runs a test body against a fresh root scope
#[derive(Debug, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    /// Create a new runner with the given config
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run `body` and report whether the whole run succeeded.
    ///
    /// A failure of the output sink makes the run unsuccessful.
    pub fn run<F>(&self, body: F) -> bool
    where
        F: FnOnce(&Reporter),
    {
        match self.try_run(body) {
            Ok(success) => success,
            Err(e) => {
                tracing::error!(error = %e, "TAP output failed");
                false
            }
        }
    }

    /// Like [`Runner::run`], but a failure of the output sink is returned
    /// as an error instead of being folded into the verdict.
    pub fn try_run<F>(&self, body: F) -> Result<bool, TapError>
    where
        F: FnOnce(&Reporter),
    {
        let out = self.config.output.clone();
        if self.config.version_header {
            out.line("", format_args!("{}", VERSION_LINE));
        }

        debug!("run started");
        let root = Reporter::new(out.clone());
        body(&root);
        let success = root.summary();
        debug!(success, count = root.count(), failed = root.failed(), "run finished");

        out.finish()?;
        Ok(success)
    }
}

/// Builder API for convenient runner construction
#[derive(Debug, Default)]
pub struct RunnerBuilder {
    config: RunConfig,
}

impl RunnerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output sink
    pub fn output(mut self, output: Output) -> Self {
        self.config.output = output;
        self
    }

    /// Emit the `TAP version 14` line first
    pub fn version_header(mut self, enabled: bool) -> Self {
        self.config.version_header = enabled;
        self
    }

    /// Build and return the runner
    pub fn build(self) -> Runner {
        Runner::new(self.config)
    }

    /// Build and run `body`
    pub fn run<F>(self, body: F) -> bool
    where
        F: FnOnce(&Reporter),
    {
        self.build().run(body)
    }
}

/// Convenience function: create a runner builder
pub fn builder() -> RunnerBuilder {
    RunnerBuilder::new()
}

/// Run `body` against a root scope writing to stdout.
///
/// ```rust,no_run
/// let ok = tap_reporter::run(|t| {
///     t.ok(1 + 1 == 2, "addition");
///     t.subtest("strings", |t| {
///         t.plan(1);
///         t.is("a".repeat(2), "aa".to_string(), "repeat");
///     });
/// });
/// assert!(ok);
/// ```
pub fn run<F>(body: F) -> bool
where
    F: FnOnce(&Reporter),
{
    Runner::default().run(body)
}

/// Run `body` and integrate with `#[test]` by panicking on failure.
///
/// The run is configured from the environment (see [`RunConfig::from_env`]).
///
/// ```rust,ignore
/// #[test]
/// fn parser_suite() {
///     tap_reporter::run_and_assert(|t| {
///         t.ok(parse("1 + 2").is_ok(), "parses addition");
///     });
/// }
/// ```
pub fn run_and_assert<F>(body: F)
where
    F: FnOnce(&Reporter),
{
    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => panic!("invalid TAP configuration: {}", e),
    };
    match Runner::new(config).try_run(body) {
        Ok(true) => {}
        Ok(false) => panic!("TAP run failed"),
        Err(e) => panic!("TAP output failed: {}", e),
    }
}
