//! Locations of files the build read or produced.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};

/// One file, either under the workspace or under the build's output tree.
///
/// A location never stores an absolute path: output roots change between
/// invocations, so resolution happens only through
/// [`ArtifactLocationDecoder`](crate::ArtifactLocationDecoder).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Output-tree root below the execution root, e.g. `bazel-out/k8-fastbuild/bin`.
    /// Empty for source files.
    #[serde(default)]
    pub root_execution_path_fragment: String,
    /// Path below the root.
    pub relative_path: String,
    /// `true` for checked-in sources, `false` for generated files.
    #[serde(default)]
    pub is_source: bool,
}

impl ArtifactLocation {
    /// A checked-in file at a workspace-relative path.
    pub fn source(relative_path: impl Into<String>) -> Self {
        Self {
            root_execution_path_fragment: String::new(),
            relative_path: relative_path.into(),
            is_source: true,
        }
    }

    /// A generated file under an output root.
    pub fn generated(root: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            root_execution_path_fragment: root.into(),
            relative_path: relative_path.into(),
            is_source: false,
        }
    }

    /// Returns `true` for files belonging to an external repository.
    pub fn is_external(&self) -> bool {
        self.relative_path.starts_with("external/")
    }

    /// The path relative to the execution root.
    ///
    /// Stable across invocations, which makes it suitable as an identity key.
    pub fn execution_root_relative_path(&self) -> String {
        join(&self.root_execution_path_fragment, &self.relative_path)
    }

    /// Checks that both path components are relative and stay inside their root.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.relative_path.is_empty() {
            return Err(ArtifactError::EmptyPath);
        }
        for part in [&self.root_execution_path_fragment, &self.relative_path] {
            if part.starts_with('/') || part.contains(":\\") {
                return Err(ArtifactError::AbsolutePath(part.clone()));
            }
            if part.split(['/', '\\']).any(|seg| seg == "..") {
                return Err(ArtifactError::ParentReference(part.clone()));
            }
        }
        Ok(())
    }
}

/// Compiled output attached to a target: the jar the IDE indexes, plus the
/// runtime and source jars when the build provides them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LibraryArtifact {
    /// The primary (usually interface) jar.
    pub jar: ArtifactLocation,
    /// The full class jar, when different from `jar`.
    #[serde(default)]
    pub runtime_jar: Option<ArtifactLocation>,
    /// The source jar for navigation and debugging.
    #[serde(default)]
    pub source_jar: Option<ArtifactLocation>,
}

impl LibraryArtifact {
    /// A library consisting of only a primary jar.
    pub fn new(jar: ArtifactLocation) -> Self {
        Self {
            jar,
            runtime_jar: None,
            source_jar: None,
        }
    }

    /// Sets the runtime jar.
    pub fn with_runtime_jar(mut self, runtime_jar: ArtifactLocation) -> Self {
        self.runtime_jar = Some(runtime_jar);
        self
    }

    /// Sets the source jar.
    pub fn with_source_jar(mut self, source_jar: ArtifactLocation) -> Self {
        self.source_jar = Some(source_jar);
        self
    }

    /// Every location this artifact refers to, primary jar first.
    pub fn locations(&self) -> impl Iterator<Item = &ArtifactLocation> {
        std::iter::once(&self.jar)
            .chain(self.runtime_jar.as_ref())
            .chain(self.source_jar.as_ref())
    }

    /// Validates every location.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.locations().try_for_each(ArtifactLocation::validate)
    }
}

/// Joins two path fragments with `/`, treating empty fragments as absent.
pub(crate) fn join(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{}/{}", first.trim_end_matches('/'), second),
    }
}
