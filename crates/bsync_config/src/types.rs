//! Configuration types deserialized from `bsync.toml`.

use bsync_ideinfo::{LanguageLevel, WorkspacePath};
use serde::{Deserialize, Serialize};

/// The top-level sync configuration parsed from `bsync.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Which parts of the workspace are imported as editable content.
    #[serde(default)]
    pub project: ProjectSection,
    /// Java-specific settings.
    #[serde(default)]
    pub java: JavaSection,
    /// Engine behavior.
    #[serde(default)]
    pub sync: SyncSection,
}

/// The `[project]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Workspace directories whose targets are imported as content.
    #[serde(default)]
    pub directories: Vec<WorkspacePath>,
    /// Subdirectories of `directories` to leave out.
    #[serde(default)]
    pub exclude_directories: Vec<WorkspacePath>,
}

impl ProjectSection {
    /// Returns `true` if `path` lies under an import directory and not under
    /// an excluded one.
    pub fn includes(&self, path: &WorkspacePath) -> bool {
        self.directories.iter().any(|d| d.is_ancestor_of(path))
            && !self.exclude_directories.iter().any(|d| d.is_ancestor_of(path))
    }
}

/// The `[java]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JavaSection {
    /// Forces the project language level regardless of what targets request.
    #[serde(default)]
    pub language_level: Option<LanguageLevel>,
    /// Glob patterns; libraries whose jar matches are not attached.
    #[serde(default)]
    pub exclude_library: Vec<String>,
    /// Attach source jars to every library instead of on demand.
    #[serde(default)]
    pub attach_source_jars_by_default: bool,
}

/// The `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// Use the version-control working set to pick content targets.
    #[serde(default = "default_true")]
    pub use_working_set: bool,
    /// How manifest files are compared against the previous sync.
    #[serde(default)]
    pub manifest_signature: ManifestSignature,
    /// Manifest parsing threads. `0` means one per available core.
    #[serde(default)]
    pub parallelism: usize,
    /// Drop library jars no content target depends on.
    #[serde(default)]
    pub prune_unused_libraries: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            use_working_set: true,
            manifest_signature: ManifestSignature::default(),
            parallelism: 0,
            prune_unused_libraries: false,
        }
    }
}

/// Change-detection strategy for manifest files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestSignature {
    /// File size plus modification time. Cheap, the default.
    #[default]
    Metadata,
    /// Hash of the file contents.
    Content,
}

fn default_true() -> bool {
    true
}
