use crate::error::{HarnessError, Result};
use log::info;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extension of test programs when none is configured
pub const DEFAULT_EXTENSION: &str = "lox";

/// A single discovered test program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Hierarchical name: path relative to the root, extension stripped
    pub name: String,
    pub path: PathBuf,
}

impl TestCase {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Recursively find every `*.<extension>` file under `root`.
///
/// Entries are walked sorted by file name, so the returned order is stable
/// across filesystems. A missing or unreadable root is an error.
pub fn discover_cases(root: &Path, extension: &str) -> Result<Vec<TestCase>> {
    let suffix = format!(".{extension}");
    let mut cases = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| HarnessError::Discovery {
            root: root.to_path_buf(),
            source,
        })?;
        if !is_program_file(&entry) {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let Some(stem) = file_name.strip_suffix(&suffix) else {
            continue;
        };
        // A bare ".lox" has nothing to name the case after
        if stem.is_empty() {
            continue;
        }

        let name = case_name(root, entry.path(), stem);
        cases.push(TestCase::new(name, entry.path()));
    }

    info!("discovered {} cases under {}", cases.len(), root.display());
    Ok(cases)
}

/// Regular files, and symlinks that resolve to one
fn is_program_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file()
        || (file_type.is_symlink()
            && std::fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file()))
}

/// Join the file's directory (relative to root) with its stem.
///
/// Files directly in the root get no category prefix.
fn case_name(root: &Path, path: &Path, stem: &str) -> String {
    let category = path
        .parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .unwrap_or_else(|| Path::new(""));

    category.join(stem).to_string_lossy().into_owned()
}

/// Keep only cases whose name matches the glob pattern
pub fn filter_cases(cases: Vec<TestCase>, pattern: &glob::Pattern) -> Vec<TestCase> {
    cases
        .into_iter()
        .filter(|case| pattern.matches(&case.name))
        .collect()
}
