use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lxt",
    about = "Golden-output test runner for Lox interpreters",
    long_about = concat!(
        "lxt - Lox Test runner\n\n",
        "Runs an interpreter against every .lox program under a directory and compares ",
        "stdout/stderr byte-for-byte with sibling .stdout/.stderr files. ",
        "The bench command times repeated runs instead."
    ),
    version
)]
pub struct Cli {
    /// Interpreter executable, invoked as `<interpreter> <file>`
    #[arg(short, long, global = true)]
    pub interpreter: Option<PathBuf>,

    /// Suite configuration file
    #[arg(long, default_value = "lox-test.json", global = true)]
    pub config: PathBuf,

    /// Per-run timeout in seconds (0 disables it)
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Show timings, failure diffs and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the golden-output tests (default if no command specified)
    Test(TestArgs),

    /// Time repeated runs of each benchmark program
    Bench {
        #[command(flatten)]
        selection: Selection,

        /// Runs per benchmark
        #[arg(short = 'n', long)]
        repeat: Option<usize>,
    },

    /// List discovered cases in run order
    List {
        #[command(flatten)]
        selection: Selection,
    },
}

#[derive(Args, Debug, Default)]
pub struct TestArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Hide passing cases (also enabled by HIDE_PASSED)
    #[arg(long)]
    pub hide_passed: bool,

    /// Stop at the first failing case (also enabled by FAIL_FAST)
    #[arg(long)]
    pub fail_fast: bool,
}

/// Which cases to run
#[derive(Args, Debug, Default)]
pub struct Selection {
    /// Directory to search (defaults to the suite's tests or benchmarks dir)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only cases whose name matches this glob (e.g. "closures/*")
    #[arg(short, long)]
    pub filter: Option<String>,
}
