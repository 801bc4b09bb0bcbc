//! TAP reporter
//!
//! One [`Reporter`] exists per scope: the root scope created by the runner,
//! and one per subtest. Each scope owns its counters behind its own lock and
//! shares the run's [`Output`] with its parent.
//!
//! Result numbering is assigned and printed while the scope lock is held, so
//! concurrent `pass`/`fail` calls on the same scope get consecutive numbers
//! and their lines appear in numeric order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::capture::{self, Capture, Outcome};
use crate::output::Output;

/// Indentation added per nesting level
const INDENT_UNIT: &str = "  ";

/// Per-scope counters, guarded by the scope lock
#[derive(Debug, Default)]
struct Counters {
    /// Result lines emitted so far, including subtest lines
    count: usize,
    /// Failed results, plus one per unsuccessful child subtest
    failed: usize,
    /// Explicitly declared plan, if any
    planned: Option<usize>,
    /// Whether the `1..N` line has been written
    plan_printed: bool,
}

/// A TAP directive attached to a result line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'a> {
    None,
    Skip(&'a str),
    Todo(&'a str),
}

/// Reports results for one scope
#[derive(Debug)]
pub struct Reporter {
    counters: Mutex<Counters>,
    indent: String,
    out: Output,
}

impl Reporter {
    /// Create a root scope writing to `out`
    pub fn new(out: Output) -> Self {
        Self::with_indent(out, String::new())
    }

    fn with_indent(out: Output, indent: String) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            indent,
            out,
        }
    }

    /// Declare how many results this scope will record.
    ///
    /// Writes `1..n` unless a plan line was already written for this scope,
    /// including the implicit `1..0` written by an earlier result.
    pub fn plan(&self, n: usize) {
        let mut c = self.lock();
        c.planned = Some(n);
        self.print_plan(&mut c);
    }

    /// Record a passing result. Always returns `true`.
    pub fn pass(&self, name: &str) -> bool {
        self.record(true, name, Directive::None)
    }

    /// Record a failing result. Always returns `false`.
    pub fn fail(&self, name: &str) -> bool {
        self.record(false, name, Directive::None)
    }

    /// Record a pass if `cond` holds, a failure otherwise. Returns `cond`.
    pub fn ok(&self, cond: bool, name: &str) -> bool {
        if cond {
            self.pass(name)
        } else {
            self.fail(name)
        }
    }

    /// Record a skipped check as `ok N - name # SKIP reason`.
    pub fn skip(&self, name: &str, reason: &str) -> bool {
        self.record(true, name, Directive::Skip(reason))
    }

    /// Record a check that is expected to fail for now.
    ///
    /// Written with a `# TODO reason` directive. A failing TODO result is
    /// not counted as a failure of the scope. Returns `cond`.
    pub fn todo(&self, cond: bool, name: &str, reason: &str) -> bool {
        self.record(cond, name, Directive::Todo(reason))
    }

    /// Run `f` as a guarded check.
    ///
    /// `f` writes its output to the supplied [`Capture`] instead of the
    /// process streams. A panic inside `f` is caught and recorded as a
    /// failure of this check only. After the result line, each non-empty
    /// captured line is written as a `# <line>` diagnostic.
    pub fn check_captured<F>(&self, f: F, name: &str) -> bool
    where
        F: FnOnce(&mut Capture) -> bool,
    {
        let (outcome, captured) = capture::capture(f);
        if let Outcome::Panicked(ref msg) = outcome {
            warn!(check = name, panic = %msg, "guarded check panicked");
        }
        let passed = self.ok(outcome.passed(), name);
        for line in captured.lines() {
            self.diag(&line);
        }
        passed
    }

    /// Write a `# msg` diagnostic line. Counters are untouched.
    pub fn diag(&self, msg: &str) {
        self.out.line(&self.indent, format_args!("# {}", msg));
    }

    /// Run `body` as a nested scope and fold its outcome into this one.
    ///
    /// The child is indented two more spaces. Once `body` returns, the
    /// child's summary decides whether this scope records `ok` or `not ok`
    /// for `desc`. An unsuccessful child adds exactly one failure here, no
    /// matter how many failures it recorded itself.
    pub fn subtest<F>(&self, desc: &str, body: F) -> bool
    where
        F: FnOnce(&Reporter),
    {
        self.diag(&format!("Subtest: {}", desc));
        let child = Reporter::with_indent(self.out.clone(), format!("{}{}", self.indent, INDENT_UNIT));
        debug!(subtest = desc, depth = child.depth(), "subtest started");

        body(&child);
        let success = child.summary();
        debug!(subtest = desc, success, "subtest finished");

        let mut c = self.lock();
        // Numbered from the count before this subtest's own increment.
        let seq = c.count + 1;
        if success {
            self.out.line(&self.indent, format_args!("ok {} - {}", seq, desc));
        } else {
            c.failed += 1;
            self.out.line(&self.indent, format_args!("not ok {} - {}", seq, desc));
        }
        c.count += 1;
        success
    }

    /// Report plan mismatches and failures for this scope.
    ///
    /// Returns `true` only when no result failed and, if a plan was
    /// declared, the number of results matches it.
    pub fn summary(&self) -> bool {
        let c = self.lock();
        let mut ok = true;
        if let Some(planned) = c.planned {
            if planned != c.count {
                self.out.line(
                    &self.indent,
                    format_args!("# Planned {} tests but ran {}", planned, c.count),
                );
                ok = false;
            }
        }
        if c.failed > 0 {
            self.out.line(
                &self.indent,
                format_args!("# Tests failed: {}/{}", c.failed, c.count),
            );
            ok = false;
        }
        if !ok {
            debug!(depth = self.depth(), count = c.count, failed = c.failed, planned = ?c.planned, "scope unsuccessful");
        }
        ok
    }

    /// Nesting depth; 0 for the root scope
    pub fn depth(&self) -> usize {
        self.indent.len() / INDENT_UNIT.len()
    }

    /// Prefix written before every line of this scope
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Results recorded so far
    pub fn count(&self) -> usize {
        self.lock().count
    }

    /// Failures recorded so far
    pub fn failed(&self) -> usize {
        self.lock().failed
    }

    /// Explicitly declared plan
    pub fn planned(&self) -> Option<usize> {
        self.lock().planned
    }

    fn record(&self, passed: bool, name: &str, directive: Directive<'_>) -> bool {
        let mut c = self.lock();
        c.count += 1;
        if !passed && !matches!(directive, Directive::Todo(_)) {
            c.failed += 1;
        }
        // No explicit plan yet: the first result writes `1..0`.
        if c.count == 1 && c.planned.is_none() {
            self.print_plan(&mut c);
        }
        let status = if passed { "ok" } else { "not ok" };
        match directive {
            Directive::None => {
                self.out.line(&self.indent, format_args!("{} {} - {}", status, c.count, name))
            }
            Directive::Skip(reason) => self.out.line(
                &self.indent,
                format_args!("{} {} - {} # SKIP {}", status, c.count, name, reason),
            ),
            Directive::Todo(reason) => self.out.line(
                &self.indent,
                format_args!("{} {} - {} # TODO {}", status, c.count, name, reason),
            ),
        }
        passed
    }

    fn print_plan(&self, c: &mut Counters) {
        if !c.plan_printed {
            self.out.line(&self.indent, format_args!("1..{}", c.planned.unwrap_or(0)));
            c.plan_printed = true;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
