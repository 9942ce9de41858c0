use crate::command::ProcessRunner;
use crate::discovery::TestCase;
use crate::error::{HarnessError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::io::Write;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} {msg} [{pos}/{len}]";

/// Timing for one benchmark case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkResult {
    pub name: String,
    /// Wall time of each usable run, in nanoseconds
    pub samples: Vec<u128>,
    /// Runs dropped because they timed out or lost their output
    pub discarded: usize,
}

impl BenchmarkResult {
    /// `None` when every run was discarded
    pub fn mean_nanos(&self) -> Option<u128> {
        mean_nanos(&self.samples)
    }
}

/// Integer mean, truncating toward zero
pub fn mean_nanos(samples: &[u128]) -> Option<u128> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<u128>() / samples.len() as u128)
}

/// Render nanoseconds in the largest unit the value reaches, to 3 places
pub fn format_duration(nanos: u128) -> String {
    let (value, unit) = if nanos < 1_000 {
        (nanos as f64, "ns")
    } else if nanos < 1_000_000 {
        (nanos as f64 / 1_000.0, "μs")
    } else if nanos < 1_000_000_000 {
        (nanos as f64 / 1_000_000.0, "ms")
    } else {
        (nanos as f64 / 1_000_000_000.0, "s")
    };
    format!("{value:.3}{unit}")
}

/// Times repeated interpreter runs. Output is drained but never compared.
pub struct BenchmarkTimer<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    repeat_count: usize,
    show_progress: bool,
}

impl<'a, R: ProcessRunner + ?Sized> BenchmarkTimer<'a, R> {
    pub fn new(runner: &'a R, repeat_count: usize) -> Self {
        Self {
            runner,
            repeat_count: repeat_count.max(1),
            show_progress: false,
        }
    }

    /// Draw a repeat counter on stderr while timing
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the case `repeat_count` times.
    ///
    /// A run that times out or fails to capture output is logged and left
    /// out of the mean; the remaining repeats still run. Spawn failures
    /// abort, since they mean the interpreter path is wrong.
    pub fn time_case(&self, case: &TestCase) -> Result<BenchmarkResult> {
        let progress = self.progress_bar(&case.name);
        let mut samples = Vec::with_capacity(self.repeat_count);
        let mut discarded = 0;

        for run in 1..=self.repeat_count {
            match self.runner.run(&case.path) {
                Ok(outcome) if outcome.timed_out => {
                    warn!("{} run {run} timed out, discarding", case.name);
                    discarded += 1;
                }
                Ok(outcome) => samples.push(outcome.wall_time.as_nanos()),
                Err(HarnessError::Capture { source, .. }) => {
                    warn!("{} run {run} lost its output ({source}), discarding", case.name);
                    discarded += 1;
                }
                Err(e) => {
                    progress.finish_and_clear();
                    return Err(e);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(BenchmarkResult {
            name: case.name.clone(),
            samples,
            discarded,
        })
    }

    /// Time every case, printing `<name>: <mean>` as each finishes
    pub fn run_all<W: Write>(
        &self,
        cases: &[TestCase],
        mut out: W,
    ) -> Result<Vec<BenchmarkResult>> {
        let mut results = Vec::with_capacity(cases.len());

        for case in cases {
            write!(out, "{}: ", case.name)?;
            out.flush()?;

            let result = self.time_case(case)?;
            match result.mean_nanos() {
                Some(mean) => writeln!(out, "{}", format_duration(mean))?,
                None => writeln!(out, "no successful runs")?,
            }
            results.push(result);
        }

        Ok(results)
    }

    fn progress_bar(&self, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(self.repeat_count as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            bar.set_style(style);
        }
        bar.set_message(name.to_string());
        bar
    }
}
