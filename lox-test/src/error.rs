//! Error types for the harness
//!
//! Only harness faults live here. A failing or hanging test program is
//! reported through [`crate::golden::Verdict`], never through an error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Faults that abort the whole run
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("cannot walk test directory {}: {source}", .root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to spawn interpreter {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture output of {}: {source}", .program.display())]
    Capture {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read golden file {}: {source}", .path.display())]
    GoldenRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
