//! Golden-file verification
//!
//! Each case `foo.lox` may have siblings `foo.lox.stdout` and
//! `foo.lox.stderr` holding the exact expected bytes, and `foo.lox.ignore`
//! marking it skipped. A missing golden file expects empty output.
//!
//! The verdict never looks at the exit code: a program that exits 1 with
//! matching output passes. Error-path tests pin behaviour through stderr.

use crate::command::{ExecutionOutcome, ProcessRunner};
use crate::discovery::TestCase;
use crate::error::{HarnessError, Result};
use log::debug;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Terminal classification of one case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
    Timeout,
}

impl Verdict {
    /// Counts against the run for fail-fast and exit status
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail | Verdict::Timeout)
    }
}

/// Expected stream contents for one case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A verdict along with what produced it
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub case: TestCase,
    pub verdict: Verdict,
    /// `None` for skipped cases
    pub outcome: Option<ExecutionOutcome>,
    /// Only loaded once the program actually ran to completion
    pub expected: Option<ExpectedOutput>,
}

impl CaseResult {
    pub fn duration(&self) -> Duration {
        self.outcome
            .as_ref()
            .map(|o| o.wall_time)
            .unwrap_or_default()
    }
}

/// `<case path><suffix>`, e.g. `a/b.lox` + `.stdout` -> `a/b.lox.stdout`
pub fn sibling_path(source: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(source.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

pub fn is_skipped(source: &Path) -> bool {
    sibling_path(source, ".ignore").exists()
}

/// Read a golden file. Absent means empty; any other read failure is an error.
fn read_golden(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} absent, expecting empty output", path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(HarnessError::GoldenRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn load_expected(source: &Path) -> Result<ExpectedOutput> {
    Ok(ExpectedOutput {
        stdout: read_golden(&sibling_path(source, ".stdout"))?,
        stderr: read_golden(&sibling_path(source, ".stderr"))?,
    })
}

/// Byte-exact comparison of both streams
pub fn compare(expected: &ExpectedOutput, outcome: &ExecutionOutcome) -> Verdict {
    if expected.stdout == outcome.stdout && expected.stderr == outcome.stderr {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// Run one case end to end.
///
/// The skip marker is checked first; the runner is never invoked for a
/// skipped case.
pub fn evaluate_case<R: ProcessRunner + ?Sized>(
    case: &TestCase,
    runner: &R,
) -> Result<CaseResult> {
    if is_skipped(&case.path) {
        return Ok(CaseResult {
            case: case.clone(),
            verdict: Verdict::Skip,
            outcome: None,
            expected: None,
        });
    }

    let outcome = runner.run(&case.path)?;
    if outcome.timed_out {
        return Ok(CaseResult {
            case: case.clone(),
            verdict: Verdict::Timeout,
            outcome: Some(outcome),
            expected: None,
        });
    }

    let expected = load_expected(&case.path)?;
    let verdict = compare(&expected, &outcome);

    Ok(CaseResult {
        case: case.clone(),
        verdict,
        outcome: Some(outcome),
        expected: Some(expected),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    /// Replays canned outcomes keyed by source path and records every call
    #[derive(Default)]
    pub(crate) struct SpyRunner {
        pub outcomes: HashMap<PathBuf, ExecutionOutcome>,
        pub calls: RefCell<Vec<PathBuf>>,
        pub count: Cell<usize>,
    }

    impl SpyRunner {
        pub fn with(mut self, source: &Path, stdout: &[u8], stderr: &[u8], exit_code: i32) -> Self {
            self.outcomes
                .insert(source.to_path_buf(), outcome(stdout, stderr, exit_code));
            self
        }
    }

    impl ProcessRunner for SpyRunner {
        fn run(&self, source: &Path) -> Result<ExecutionOutcome> {
            self.count.set(self.count.get() + 1);
            self.calls.borrow_mut().push(source.to_path_buf());
            Ok(self
                .outcomes
                .get(source)
                .cloned()
                .unwrap_or_else(|| outcome(b"", b"", 0)))
        }
    }

    pub(crate) fn outcome(stdout: &[u8], stderr: &[u8], exit_code: i32) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
            exit_code,
            wall_time: Duration::from_millis(1),
            timed_out: false,
        }
    }

    fn case_in(dir: &Path, name: &str) -> TestCase {
        let path = dir.join(format!("{name}.lox"));
        fs::write(&path, "").unwrap();
        TestCase::new(name, path)
    }

    #[test]
    fn test_sibling_path_appends_to_full_name() {
        let path = sibling_path(Path::new("cat/x.lox"), ".stdout");
        assert_eq!(path, PathBuf::from("cat/x.lox.stdout"));
    }

    #[test]
    fn test_ignore_marker_wins_and_runner_is_not_called() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "skipped");
        fs::write(sibling_path(&case.path, ".ignore"), "anything").unwrap();
        fs::write(sibling_path(&case.path, ".stdout"), "never matches").unwrap();
        let runner = SpyRunner::default().with(&case.path, b"other", b"", 0);

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Skip);
        assert_eq!(runner.count.get(), 0);
        assert!(result.outcome.is_none());
    }

    #[test]
    fn test_no_golden_files_and_no_output_passes() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "quiet");
        let runner = SpyRunner::default();

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Pass);
        assert_eq!(runner.count.get(), 1);
    }

    #[test]
    fn test_empty_golden_file_same_as_absent() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "empty");
        fs::write(sibling_path(&case.path, ".stdout"), "").unwrap();
        fs::write(sibling_path(&case.path, ".stderr"), "").unwrap();

        let expected = load_expected(&case.path).unwrap();
        assert_eq!(expected, ExpectedOutput::default());

        let result = evaluate_case(&case, &SpyRunner::default()).unwrap();
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn test_unexpected_output_without_golden_fails() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "noisy");
        let runner = SpyRunner::default().with(&case.path, b"", b"warning\n", 0);

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn test_trailing_byte_difference_fails() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "newline");
        fs::write(sibling_path(&case.path, ".stdout"), "hello\n").unwrap();
        let runner = SpyRunner::default().with(&case.path, b"hello", b"", 0);

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn test_exit_code_does_not_affect_verdict() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "error_path");
        fs::write(sibling_path(&case.path, ".stdout"), "partial\n").unwrap();
        fs::write(sibling_path(&case.path, ".stderr"), "[line 1] Error\n").unwrap();
        let runner =
            SpyRunner::default().with(&case.path, b"partial\n", b"[line 1] Error\n", 1);

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Pass);
        assert_eq!(result.outcome.unwrap().exit_code, 1);
    }

    #[test]
    fn test_stderr_mismatch_alone_fails() {
        let expected = ExpectedOutput {
            stdout: b"1\n".to_vec(),
            stderr: b"boom\n".to_vec(),
        };
        assert_eq!(compare(&expected, &outcome(b"1\n", b"boom\n", 0)), Verdict::Pass);
        assert_eq!(compare(&expected, &outcome(b"1\n", b"bang\n", 0)), Verdict::Fail);
    }

    #[test]
    fn test_timeout_becomes_verdict_without_golden_read() {
        struct Hung;
        impl ProcessRunner for Hung {
            fn run(&self, _source: &Path) -> Result<ExecutionOutcome> {
                let mut timed_out = outcome(b"", b"", -1);
                timed_out.timed_out = true;
                Ok(timed_out)
            }
        }

        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "loop");

        let result = evaluate_case(&case, &Hung).unwrap();
        assert_eq!(result.verdict, Verdict::Timeout);
        assert!(result.verdict.is_failure());
        assert!(result.expected.is_none());
    }

    #[test]
    fn test_unreadable_golden_is_error_not_empty() {
        let dir = tempdir().unwrap();
        let case = case_in(dir.path(), "broken");
        // A directory where the golden file should be cannot be read as bytes
        fs::create_dir(sibling_path(&case.path, ".stdout")).unwrap();

        let err = evaluate_case(&case, &SpyRunner::default()).unwrap_err();
        assert!(matches!(err, HarnessError::GoldenRead { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_real_interpreter_end_to_end() {
        use crate::command::InterpreterRunner;

        let dir = tempdir().unwrap();
        let path = dir.path().join("echo.lox");
        fs::write(&path, "echo 42\necho oops >&2\nexit 70\n").unwrap();
        fs::write(sibling_path(&path, ".stdout"), "42\n").unwrap();
        fs::write(sibling_path(&path, ".stderr"), "oops\n").unwrap();
        let case = TestCase::new("echo", path);
        let runner = InterpreterRunner::new("sh", Some(Duration::from_secs(30))).unwrap();

        let result = evaluate_case(&case, &runner).unwrap();
        assert_eq!(result.verdict, Verdict::Pass);
    }
}
