use crate::command::ProcessRunner;
use crate::config::RunConfig;
use crate::discovery::TestCase;
use crate::error::Result;
use crate::golden::evaluate_case;
use crate::reporter::{ResultTally, TestReporter};
use log::info;
use std::io::Write;

/// Outcome of a whole test run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub tally: ResultTally,
    /// Fail-fast cut the run short
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.stopped_early {
            1
        } else {
            self.tally.exit_code()
        }
    }
}

/// Test runner that executes cases one at a time in discovery order
pub struct TestRunner<'a, R: ProcessRunner + ?Sized> {
    config: RunConfig,
    runner: &'a R,
}

impl<'a, R: ProcessRunner + ?Sized> TestRunner<'a, R> {
    pub fn new(config: RunConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run all cases, reporting each as it finishes
    pub fn run_all<W: Write>(&self, cases: &[TestCase], out: W) -> Result<RunSummary> {
        let mut reporter = TestReporter::new(
            out,
            self.config.suppress_passed_output,
            self.config.stop_on_first_failure,
            self.config.verbose,
        );

        for case in cases {
            let result = evaluate_case(case, self.runner)?;
            reporter.record(&result)?;

            if reporter.should_stop() {
                info!("stopping after first failure: {}", case.name);
                break;
            }
        }

        let stopped_early = reporter.should_stop();
        let tally = reporter.finish()?;
        Ok(RunSummary { tally, stopped_early })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::golden::sibling_path;
    use crate::golden::tests::SpyRunner;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn write_case(dir: &Path, name: &str, golden_stdout: Option<&str>) -> TestCase {
        let path = dir.join(format!("{name}.lox"));
        fs::write(&path, "").unwrap();
        if let Some(stdout) = golden_stdout {
            fs::write(sibling_path(&path, ".stdout"), stdout).unwrap();
        }
        TestCase::new(name, path)
    }

    #[test]
    fn test_one_verdict_per_case_in_order() {
        let dir = tempdir().unwrap();
        let a = write_case(dir.path(), "a", Some("1\n"));
        let b = write_case(dir.path(), "b", Some("2\n"));
        let c = write_case(dir.path(), "c", None);
        fs::write(sibling_path(&c.path, ".ignore"), "").unwrap();
        let spy = SpyRunner::default()
            .with(&a.path, b"1\n", b"", 0)
            .with(&b.path, b"wrong\n", b"", 0);
        let cases = vec![a.clone(), b.clone(), c];

        let mut buf = Vec::new();
        let summary = TestRunner::new(RunConfig::default(), &spy)
            .run_all(&cases, &mut buf)
            .unwrap();

        assert_eq!(summary.tally.total(), cases.len());
        assert_eq!(summary.tally.passed, 1);
        assert_eq!(summary.tally.failed, 1);
        assert_eq!(summary.tally.skipped, 1);
        assert!(!summary.stopped_early);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(*spy.calls.borrow(), vec![a.path, b.path]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        assert!(text.contains("1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_fail_fast_never_runs_later_cases() {
        let dir = tempdir().unwrap();
        let a = write_case(dir.path(), "a", None);
        let b = write_case(dir.path(), "b", Some("expected\n"));
        let c = write_case(dir.path(), "c", None);
        let spy = SpyRunner::default();
        let config = RunConfig {
            stop_on_first_failure: true,
            ..RunConfig::default()
        };

        let mut buf = Vec::new();
        let summary = TestRunner::new(config, &spy)
            .run_all(&[a.clone(), b.clone(), c], &mut buf)
            .unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(spy.count.get(), 2);
        assert_eq!(*spy.calls.borrow(), vec![a.path, b.path]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        let reported: Vec<&str> = text.lines().collect();
        assert_eq!(reported.len(), 2);
        assert!(reported[0].ends_with(" a"));
        assert!(reported[1].ends_with(" b"));
        assert!(!text.contains("skipped"));
    }

    #[test]
    fn test_all_passing_exits_zero() {
        let dir = tempdir().unwrap();
        let cases = vec![
            write_case(dir.path(), "x", None),
            write_case(dir.path(), "y", Some("")),
        ];
        let spy = SpyRunner::default();
        let config = RunConfig {
            suppress_passed_output: true,
            ..RunConfig::default()
        };

        let mut buf = Vec::new();
        let summary = TestRunner::new(config, &spy).run_all(&cases, &mut buf).unwrap();

        assert_eq!(summary.exit_code(), 0);
        let text = String::from_utf8_lossy(&buf).into_owned();
        assert!(!text.contains("PASS"));
        assert!(text.contains("2 passed, 0 failed, 0 skipped"));
    }

    #[test]
    fn test_runner_fault_aborts_the_run() {
        struct Broken;
        impl ProcessRunner for Broken {
            fn run(&self, _source: &Path) -> Result<crate::command::ExecutionOutcome> {
                Err(HarnessError::Spawn {
                    program: PathBuf::from("missing-lox"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                })
            }
        }

        let dir = tempdir().unwrap();
        let cases = vec![write_case(dir.path(), "a", None)];

        let err = TestRunner::new(RunConfig::default(), &Broken)
            .run_all(&cases, Vec::new())
            .unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }
}
