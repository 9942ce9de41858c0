pub mod bench;
pub mod cli;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod golden;
pub mod reporter;
pub mod runner;

// Re-export commonly used types
pub use command::{ExecutionOutcome, InterpreterRunner, ProcessRunner};
pub use config::{RunConfig, SuiteConfig};
pub use discovery::TestCase;
pub use error::HarnessError;
pub use golden::Verdict;
pub use runner::{RunSummary, TestRunner};
