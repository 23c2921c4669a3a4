//! Workspace-relative paths and the working set.

use crate::error::WorkspacePathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A normalized path relative to the workspace root.
///
/// Stored with `/` separators, no leading `./`, no trailing slash and no
/// empty segments. The workspace root itself is the empty path.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspacePath(String);

impl WorkspacePath {
    /// Validates and normalizes a relative path.
    pub fn new(path: &str) -> Result<Self, WorkspacePathError> {
        if path.starts_with('/') || path.contains(":\\") {
            return Err(WorkspacePathError::Absolute(path.to_string()));
        }
        let mut segments = Vec::new();
        for segment in path.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => return Err(WorkspacePathError::ParentReference(path.to_string())),
                s => segments.push(s),
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// The normalized path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the workspace root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `self` equals `other` or contains it.
    pub fn is_ancestor_of(&self, other: &WorkspacePath) -> bool {
        if self.is_root() {
            return true;
        }
        match other.0.strip_prefix(&self.0) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<WorkspacePath> {
        if self.is_root() {
            return None;
        }
        let parent = match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        };
        Some(Self(parent.to_string()))
    }

    /// Appends a relative path.
    pub fn join(&self, child: &str) -> Result<WorkspacePath, WorkspacePathError> {
        let child = WorkspacePath::new(child)?;
        Ok(Self(crate::artifact::join(&self.0, &child.0)))
    }

    /// The final segment, or `""` for the root.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }
}

impl TryFrom<String> for WorkspacePath {
    type Error = WorkspacePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WorkspacePath::new(&value)
    }
}

impl From<WorkspacePath> for String {
    fn from(path: WorkspacePath) -> Self {
        path.0
    }
}

impl fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for WorkspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkspacePath({:?})", self.0)
    }
}

/// The absolute directory holding the workspace sources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    /// Wraps an absolute directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self(dir.into())
    }

    /// The root directory.
    pub fn directory(&self) -> &Path {
        &self.0
    }

    /// The absolute path of a workspace path.
    pub fn file_for_path(&self, path: &WorkspacePath) -> PathBuf {
        if path.is_root() {
            self.0.clone()
        } else {
            self.0.join(path.as_str())
        }
    }

    /// The workspace path of an absolute file, if it lies inside the workspace.
    pub fn workspace_path_for(&self, file: &Path) -> Option<WorkspacePath> {
        let rel = file.strip_prefix(&self.0).ok()?;
        let rel = rel.to_str()?;
        WorkspacePath::new(rel).ok()
    }

    /// Returns `true` if `file` lies inside the workspace.
    pub fn is_in_workspace(&self, file: &Path) -> bool {
        self.workspace_path_for(file).is_some()
    }
}

/// Files the version-control system reports as changed locally.
///
/// When present, a target is imported as editable content if one of its
/// sources is in the set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSet {
    /// Newly created files.
    #[serde(default)]
    pub added_files: Vec<WorkspacePath>,
    /// Edited files.
    #[serde(default)]
    pub modified_files: Vec<WorkspacePath>,
    /// Deleted files.
    #[serde(default)]
    pub deleted_files: Vec<WorkspacePath>,
}

impl WorkingSet {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Files that exist on disk: added followed by modified.
    pub fn present_files(&self) -> impl Iterator<Item = &WorkspacePath> {
        self.added_files.iter().chain(&self.modified_files)
    }
}
