use crate::golden::{CaseResult, Verdict};
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::{self, Write};

/// Number of diff lines shown per stream
const MAX_DIFF_LINES: usize = 20;

/// Console label for a verdict
pub fn verdict_label(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Pass => "PASS".green(),
        Verdict::Fail => "FAIL".red(),
        Verdict::Skip => "SKIP".dimmed(),
        Verdict::Timeout => "TIMEOUT".red().bold(),
    }
}

/// Per-verdict counts for a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResultTally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timed_out: usize,
}

impl ResultTally {
    pub fn add(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail => self.failed += 1,
            Verdict::Skip => self.skipped += 1,
            Verdict::Timeout => self.timed_out += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.timed_out
    }

    /// `<passed> passed, <failed> failed, <skipped> skipped`
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        );
        if self.timed_out > 0 {
            line.push_str(&format!(", {} timed out", self.timed_out));
        }
        line
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 && self.timed_out == 0 {
            0
        } else {
            1
        }
    }
}

/// Prints per-case lines and the final tally
pub struct TestReporter<W: Write> {
    out: W,
    hide_passed: bool,
    fail_fast: bool,
    verbose: bool,
    tally: ResultTally,
    stopped: bool,
}

impl<W: Write> TestReporter<W> {
    pub fn new(out: W, hide_passed: bool, fail_fast: bool, verbose: bool) -> Self {
        Self {
            out,
            hide_passed,
            fail_fast,
            verbose,
            tally: ResultTally::default(),
            stopped: false,
        }
    }

    /// Count a result and print its line unless it is a hidden pass
    pub fn record(&mut self, result: &CaseResult) -> io::Result<()> {
        self.tally.add(result.verdict);

        if !(self.hide_passed && result.verdict == Verdict::Pass) {
            if self.verbose && result.outcome.is_some() {
                writeln!(
                    self.out,
                    "{} {} {}",
                    verdict_label(result.verdict),
                    result.case.name,
                    format!("({}ms)", result.duration().as_millis()).dimmed()
                )?;
            } else {
                writeln!(self.out, "{} {}", verdict_label(result.verdict), result.case.name)?;
            }
        }

        if self.verbose && result.verdict == Verdict::Fail {
            self.print_mismatch(result)?;
        }

        if self.fail_fast && result.verdict.is_failure() {
            self.stopped = true;
        }
        Ok(())
    }

    /// Fail-fast tripped; no further cases should run
    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Print the tally, unless the run was cut short by fail-fast
    pub fn finish(mut self) -> io::Result<ResultTally> {
        if !self.stopped {
            writeln!(self.out)?;
            writeln!(self.out, "Test Results:")?;
            writeln!(self.out, "{}", self.tally.summary_line())?;
        }
        self.out.flush()?;
        Ok(self.tally)
    }

    fn print_mismatch(&mut self, result: &CaseResult) -> io::Result<()> {
        let (Some(expected), Some(actual)) = (&result.expected, &result.outcome) else {
            return Ok(());
        };

        if expected.stdout != actual.stdout {
            self.print_diff("stdout", &expected.stdout, &actual.stdout)?;
        }
        if expected.stderr != actual.stderr {
            self.print_diff("stderr", &expected.stderr, &actual.stderr)?;
        }
        writeln!(self.out, "  {}", format!("exit code {}", actual.exit_code).dimmed())
    }

    fn print_diff(&mut self, stream: &str, expected: &[u8], actual: &[u8]) -> io::Result<()> {
        // Lossy decoding is for display only
        let expected = String::from_utf8_lossy(expected);
        let actual = String::from_utf8_lossy(actual);

        writeln!(self.out, "  {}", format!("{stream} mismatch:").red().bold())?;
        let diff = TextDiff::from_lines(expected.as_ref(), actual.as_ref());
        for change in diff.iter_all_changes().take(MAX_DIFF_LINES) {
            let sign = match change.tag() {
                ChangeTag::Delete => "-".red(),
                ChangeTag::Insert => "+".green(),
                ChangeTag::Equal => " ".dimmed(),
            };
            write!(self.out, "  {}{}", sign, change)?;
            if change.missing_newline() {
                writeln!(self.out, "{}", " (no newline)".dimmed())?;
            }
        }
        Ok(())
    }
}
