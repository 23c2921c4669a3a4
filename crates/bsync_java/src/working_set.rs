//! The Java view of the working set.

use bsync_ideinfo::{WorkingSet, WorkspacePath};
use std::collections::BTreeSet;

/// Locally added or modified `.java` files.
///
/// Deleted files cannot make a target editable and are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JavaWorkingSet {
    java_files: BTreeSet<WorkspacePath>,
}

impl JavaWorkingSet {
    /// Filters the working set down to Java sources.
    pub fn new(working_set: &WorkingSet) -> Self {
        let java_files = working_set
            .present_files()
            .filter(|p| p.file_name().ends_with(".java"))
            .cloned()
            .collect();
        Self { java_files }
    }

    /// Returns `true` if `path` is a locally changed Java file.
    pub fn contains(&self, path: &WorkspacePath) -> bool {
        self.java_files.contains(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.java_files.len()
    }

    /// Returns `true` if no Java file changed.
    pub fn is_empty(&self) -> bool {
        self.java_files.is_empty()
    }
}
