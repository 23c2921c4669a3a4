//! The project model produced by an import.

use bsync_ideinfo::{ArtifactLocation, LanguageLevel, LibraryArtifact};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// A source folder inside a content entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlazeSourceDirectory {
    /// Absolute directory.
    pub directory: PathBuf,
    /// Java package of files directly in `directory`; empty for a package root.
    pub package_prefix: String,
    /// `true` if only test targets contribute sources here.
    pub is_test: bool,
}

/// One editable root of the project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlazeContentEntry {
    /// Absolute root directory.
    pub content_root: PathBuf,
    /// Source folders below the root, sorted by directory.
    pub sources: Vec<BlazeSourceDirectory>,
    /// Excluded directories below the root, sorted.
    pub excludes: Vec<PathBuf>,
}

/// Identity of a library: the execution-root-relative path of its primary
/// jar, optionally qualified by a classifier.
///
/// Written as `path` or `path#classifier`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LibraryKey(String);

impl LibraryKey {
    /// The key of the library whose primary jar is `jar`.
    pub fn from_jar(jar: &ArtifactLocation) -> Self {
        Self(jar.execution_root_relative_path())
    }

    /// A key with an explicit classifier, for several libraries sharing a jar.
    pub fn with_classifier(jar: &ArtifactLocation, classifier: &str) -> Self {
        Self(format!("{}#{classifier}", jar.execution_root_relative_path()))
    }

    /// The primary jar path.
    pub fn location(&self) -> &str {
        self.0.split_once('#').map_or(&self.0, |(path, _)| path)
    }

    /// The classifier, if any.
    pub fn classifier(&self) -> Option<&str> {
        self.0.split_once('#').map(|(_, c)| c)
    }

    /// The key as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LibraryKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<LibraryKey> for String {
    fn from(key: LibraryKey) -> Self {
        key.0
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LibraryKey({})", self.0)
    }
}

/// A non-editable dependency of the project.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlazeLibrary {
    /// Identity.
    pub key: LibraryKey,
    /// The jars making up the library.
    pub library_artifact: LibraryArtifact,
}

impl BlazeLibrary {
    /// A library keyed by its primary jar.
    pub fn new(library_artifact: LibraryArtifact) -> Self {
        Self {
            key: LibraryKey::from_jar(&library_artifact.jar),
            library_artifact,
        }
    }
}

/// Everything one import produced.
///
/// Collections are ordered so that equal inputs give equal, and equally
/// serialized, results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Editable roots, sorted by root.
    pub content_entries: Vec<BlazeContentEntry>,
    /// Deduplicated libraries.
    pub libraries: BTreeMap<LibraryKey, BlazeLibrary>,
    /// Every jar the build produces for Java targets.
    pub build_output_jars: BTreeSet<PathBuf>,
    /// Java sources of content targets.
    pub java_source_files: BTreeSet<PathBuf>,
    /// Highest language level requested, if any target requested one.
    pub source_version: Option<LanguageLevel>,
}

/// Java data carried from one sync to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaSyncData {
    /// The import.
    pub import_result: ImportResult,
    /// Exclusion globs in effect for this sync.
    pub excluded_libraries: Vec<String>,
    /// Whether source jars were attached to every library.
    pub attach_source_jars_by_default: bool,
    /// Libraries handed to the project model, after exclusions and
    /// augmenter contributions.
    pub attached_libraries: BTreeMap<LibraryKey, BlazeLibrary>,
}
