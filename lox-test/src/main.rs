use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use lox_test::bench::BenchmarkTimer;
use lox_test::cli::{Cli, Command, Selection, TestArgs};
use lox_test::config::{self, RunConfig, SuiteConfig};
use lox_test::discovery::{self, TestCase};
use lox_test::{InterpreterRunner, TestRunner};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let suite = config::load_suite_config(&cli.config)?;
    let run_config = build_run_config(&cli, &suite);

    match cli.command {
        Some(Command::List { ref selection }) => {
            let cases = collect_cases(selection, &suite.tests_dir, &suite)?;
            for case in &cases {
                println!("{}", case.name);
            }
            Ok(())
        }

        Some(Command::Bench { ref selection, repeat }) => {
            let cases = collect_cases(selection, &suite.benchmarks_dir, &suite)?;
            let timeout = config::resolve_timeout(
                cli.timeout.or(suite.timeout_secs),
                config::DEFAULT_BENCH_TIMEOUT,
            );
            let interpreter = InterpreterRunner::new(interpreter_path(&cli, &suite)?, timeout)?;
            let repeat_count = repeat.unwrap_or(run_config.repeat_count);
            if repeat_count == 0 {
                anyhow::bail!("--repeat must be at least 1");
            }

            BenchmarkTimer::new(&interpreter, repeat_count)
                .with_progress(io::stderr().is_terminal())
                .run_all(&cases, io::stdout().lock())?;
            Ok(())
        }

        Some(Command::Test(ref args)) => run_tests(&cli, args, &suite, run_config),

        None => run_tests(&cli, &TestArgs::default(), &suite, run_config),
    }
}

fn run_tests(
    cli: &Cli,
    args: &TestArgs,
    suite: &SuiteConfig,
    mut run_config: RunConfig,
) -> Result<()> {
    run_config.suppress_passed_output |= args.hide_passed;
    run_config.stop_on_first_failure |= args.fail_fast;

    let cases = collect_cases(&args.selection, &suite.tests_dir, suite)?;
    let interpreter = InterpreterRunner::new(interpreter_path(cli, suite)?, run_config.timeout)?;

    let summary =
        TestRunner::new(run_config, &interpreter).run_all(&cases, io::stdout().lock())?;

    process::exit(summary.exit_code())
}

/// CLI flags win over the suite file; HIDE_PASSED and FAIL_FAST are read here only
fn build_run_config(cli: &Cli, suite: &SuiteConfig) -> RunConfig {
    let defaults = RunConfig::default();

    let timeout = config::resolve_timeout(cli.timeout.or(suite.timeout_secs), defaults.timeout);

    RunConfig {
        suppress_passed_output: config::env_flag(std::env::var_os("HIDE_PASSED").as_deref()),
        stop_on_first_failure: config::env_flag(std::env::var_os("FAIL_FAST").as_deref()),
        repeat_count: suite.repeat_count.unwrap_or(defaults.repeat_count),
        timeout,
        verbose: cli.verbose,
    }
}

fn interpreter_path(cli: &Cli, suite: &SuiteConfig) -> Result<PathBuf> {
    cli.interpreter
        .clone()
        .or_else(|| suite.interpreter.clone())
        .context("no interpreter configured (use --interpreter or the suite file)")
}

fn collect_cases(
    selection: &Selection,
    default_dir: &Path,
    suite: &SuiteConfig,
) -> Result<Vec<TestCase>> {
    let root = selection.dir.as_deref().unwrap_or(default_dir);
    let cases = discovery::discover_cases(root, &suite.extension)?;

    match &selection.filter {
        Some(filter) => {
            let pattern = glob::Pattern::new(filter)
                .with_context(|| format!("invalid filter pattern '{filter}'"))?;
            Ok(discovery::filter_cases(cases, &pattern))
        }
        None => Ok(cases),
    }
}
