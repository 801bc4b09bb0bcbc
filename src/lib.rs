//! tap-reporter: a Test Anything Protocol result reporter
//!
//! Test code reports outcomes to a [`Reporter`]; the reporter writes a TAP
//! stream and keeps the pass/fail/plan accounting for its scope. Subtests
//! are nested scopes whose overall outcome is folded back into the parent as
//! a single result.
//!
//! # Overview
//!
//! ```rust,no_run
//! let ok = tap_reporter::run(|t| {
//!     t.pass("setup");
//!     t.subtest("parser", |t| {
//!         t.plan(2);
//!         t.ok(true, "numbers");
//!         t.like("let x = 1;", r"^let \w+", "bindings");
//!     });
//!     t.check_captured(|out| {
//!         use std::io::Write;
//!         writeln!(out, "checked 3 files").is_ok()
//!     }, "lint");
//! });
//! std::process::exit(if ok { 0 } else { 1 });
//! ```
//!
//! # Output
//!
//! | Line | Format |
//! |------|--------|
//! | plan | `1..N` |
//! | pass | `ok <seq> - <name>` |
//! | fail | `not ok <seq> - <name>` |
//! | diagnostic | `# <text>` |
//! | subtest | `# Subtest: <description>` |
//!
//! Every line of a nested scope is indented two spaces per level.
//!
//! When a scope records its first result without an explicit plan, the plan
//! line `1..0` is written right away.

mod capture;
mod checks;
mod error;
mod output;
mod reporter;
mod runner;

pub use capture::{capture, Capture, Outcome};
pub use error::{ErrorKind, TapError};
pub use output::{Output, SharedBuffer};
pub use reporter::Reporter;
pub use runner::{RunConfig, Runner, RunnerBuilder};

// Convenience functions for cargo test integration
pub use runner::{builder, run, run_and_assert};
