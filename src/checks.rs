//! Value, text and pattern checks
//!
//! Convenience assertions layered on [`Reporter::ok`]. Each records exactly
//! one result and, on failure, explains the mismatch with diagnostic lines
//! written after the `not ok` line.

use std::fmt::Debug;

use similar::TextDiff;

use crate::reporter::Reporter;

impl Reporter {
    /// Pass when `got == expected`.
    ///
    /// On failure both values are shown in their `Debug` form.
    pub fn is<T>(&self, got: T, expected: T, name: &str) -> bool
    where
        T: PartialEq + Debug,
    {
        let passed = self.ok(got == expected, name);
        if !passed {
            self.diag(&format!("     got: {:?}", got));
            self.diag(&format!("expected: {:?}", expected));
        }
        passed
    }

    /// Pass when two texts are identical.
    ///
    /// On failure the unified line diff is written as diagnostics.
    pub fn is_text(&self, got: &str, expected: &str, name: &str) -> bool {
        let passed = self.ok(got == expected, name);
        if !passed {
            let diff = TextDiff::from_lines(expected, got);
            let udiff = diff.unified_diff().header("expected", "got").to_string();
            for line in udiff.lines() {
                self.diag(line);
            }
        }
        passed
    }

    /// Pass when `text` matches the regular expression `pattern`.
    ///
    /// The pattern is compiled in multi-line mode. An invalid pattern is
    /// recorded as a failure.
    pub fn like(&self, text: &str, pattern: &str, name: &str) -> bool {
        let re = match compile_regex(pattern) {
            Ok(re) => re,
            Err(e) => {
                let passed = self.fail(name);
                self.diag(&format!("invalid regex /{}/:", pattern));
                for line in e.to_string().lines() {
                    self.diag(&format!("  {}", line));
                }
                return passed;
            }
        };
        let passed = self.ok(re.is_match(text), name);
        if !passed {
            self.diag(&format!("no match for /{}/ in:", pattern));
            for line in text.lines() {
                self.diag(&format!("  {}", line));
            }
        }
        passed
    }
}

/// Compile with multi-line mode and a size limit to bound pathological patterns.
fn compile_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    regex::RegexBuilder::new(&format!("(?m){}", pattern))
        .size_limit(1 << 20)
        .build()
}
