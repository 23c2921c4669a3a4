//! Resolution of artifact locations to absolute paths.

use crate::artifact::ArtifactLocation;
use crate::workspace::WorkspaceRoot;
use std::path::{Path, PathBuf};

/// Output roots of one build invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlazeRoots {
    /// Directory the build executes actions in; generated files live below it.
    pub execution_root: PathBuf,
    /// Directory holding fetched external repositories under `external/`.
    pub output_base: PathBuf,
}

impl BlazeRoots {
    /// Creates roots from the two directories.
    pub fn new(execution_root: impl Into<PathBuf>, output_base: impl Into<PathBuf>) -> Self {
        Self {
            execution_root: execution_root.into(),
            output_base: output_base.into(),
        }
    }
}

/// Turns [`ArtifactLocation`]s into absolute paths.
///
/// Pure path arithmetic: nothing here touches the filesystem.
#[derive(Clone, Debug)]
pub struct ArtifactLocationDecoder {
    workspace_root: WorkspaceRoot,
    roots: BlazeRoots,
}

impl ArtifactLocationDecoder {
    /// Creates a decoder for one workspace and build.
    pub fn new(workspace_root: WorkspaceRoot, roots: BlazeRoots) -> Self {
        Self {
            workspace_root,
            roots,
        }
    }

    /// The workspace this decoder resolves sources against.
    pub fn workspace_root(&self) -> &WorkspaceRoot {
        &self.workspace_root
    }

    /// The build's output roots.
    pub fn roots(&self) -> &BlazeRoots {
        &self.roots
    }

    /// Resolves a location.
    ///
    /// Workspace sources land under the workspace root, external-repository
    /// sources under the output base, generated files under the execution
    /// root joined with their root fragment.
    pub fn decode(&self, location: &ArtifactLocation) -> PathBuf {
        if location.is_source {
            let base: &Path = if location.is_external() {
                &self.roots.output_base
            } else {
                self.workspace_root.directory()
            };
            return join_relative(base.to_path_buf(), &location.relative_path);
        }
        let under_root = join_relative(
            self.roots.execution_root.clone(),
            &location.root_execution_path_fragment,
        );
        join_relative(under_root, &location.relative_path)
    }
}

fn join_relative(mut base: PathBuf, relative: &str) -> PathBuf {
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        base.push(segment);
    }
    base
}
