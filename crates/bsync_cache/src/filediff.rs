//! File change detection against a previous snapshot.
//!
//! Each tracked file gets a [`FileSignature`]. Comparing the fresh signatures
//! with the snapshot stored by the previous sync partitions the current paths
//! into added, updated and unchanged files, and the stale snapshot entries
//! into removed files. A path that no longer exists counts as removed; any
//! other failure to read a signature is treated as transient.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use bsync_common::{CancellationToken, Cancelled, ContentHash};
use serde::{Deserialize, Serialize};

/// How a file's signature is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureMode {
    /// Length and modification time from file metadata.
    #[default]
    Metadata,
    /// XXH3-128 hash of the contents.
    Content,
}

/// What the differ remembers about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSignature {
    /// Length plus modification time in nanoseconds since the Unix epoch.
    Metadata {
        /// File length in bytes.
        len: u64,
        /// Modification time, or `0` where the platform does not report one.
        modified_nanos: u128,
    },
    /// Content hash.
    Content(ContentHash),
}

impl FileSignature {
    /// Computes the signature of `path` in the given mode.
    pub fn compute(path: &Path, mode: SignatureMode) -> std::io::Result<Self> {
        match mode {
            SignatureMode::Metadata => {
                let meta = std::fs::metadata(path)?;
                if !meta.is_file() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "not a regular file",
                    ));
                }
                let modified_nanos = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .unwrap_or(0);
                Ok(FileSignature::Metadata {
                    len: meta.len(),
                    modified_nanos,
                })
            }
            SignatureMode::Content => ContentHash::from_file(path).map(FileSignature::Content),
        }
    }
}

/// Snapshot of file signatures as of one sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    entries: BTreeMap<PathBuf, FileSignature>,
}

impl FileState {
    /// Returns the stored signature for `path`.
    pub fn get(&self, path: &Path) -> Option<&FileSignature> {
        self.entries.get(path)
    }

    /// Returns `true` if `path` is tracked.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Replaces the entry for `path` with the one from `previous`, or drops it
    /// when `previous` has none.
    ///
    /// Used when a file changed but could not be processed: restoring the old
    /// signature makes the next diff report it as changed again.
    pub fn roll_back(&mut self, path: &Path, previous: Option<&FileState>) {
        match previous.and_then(|p| p.entries.get(path)) {
            Some(sig) => {
                self.entries.insert(path.to_path_buf(), *sig);
            }
            None => {
                self.entries.remove(path);
            }
        }
    }
}

/// Result of [`FileDiffService::update_files`].
///
/// The change lists are sorted and disjoint.
#[derive(Debug, Clone, Default)]
pub struct FileDiff {
    /// The snapshot to store for the next sync.
    pub state: FileState,
    /// Paths not present in the previous snapshot.
    pub added: Vec<PathBuf>,
    /// Paths whose signature changed.
    pub updated: Vec<PathBuf>,
    /// Paths in the previous snapshot that are no longer tracked.
    pub removed: Vec<PathBuf>,
    /// Paths whose signature could not be computed this time.
    ///
    /// They appear in no other list and keep their previous snapshot entry.
    pub unreadable: Vec<PathBuf>,
}

impl FileDiff {
    /// Returns `true` if nothing was added, updated or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Files that need processing: added followed by updated.
    pub fn changed(&self) -> impl Iterator<Item = &PathBuf> {
        self.added.iter().chain(&self.updated)
    }

    /// Number of files that need processing.
    pub fn dirty_count(&self) -> usize {
        self.added.len() + self.updated.len()
    }
}

/// Computes file snapshots and diffs them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDiffService {
    mode: SignatureMode,
}

impl FileDiffService {
    /// Creates a differ using the given signature mode.
    pub fn new(mode: SignatureMode) -> Self {
        Self { mode }
    }

    /// The signature mode in use.
    pub fn mode(&self) -> SignatureMode {
        self.mode
    }

    /// Snapshots `paths` and diffs against `previous`.
    ///
    /// Without a previous snapshot every readable path is added. A previous
    /// snapshot taken in a different signature mode makes every path count
    /// as updated. The cancellation token is checked before each file.
    pub fn update_files(
        &self,
        previous: Option<&FileState>,
        paths: impl IntoIterator<Item = PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<FileDiff, Cancelled> {
        let mut diff = FileDiff::default();
        let mut current: Vec<PathBuf> = paths.into_iter().collect();
        current.sort();
        current.dedup();

        for path in &current {
            cancel.check()?;
            let old = previous.and_then(|p| p.entries.get(path));
            let sig = match FileSignature::compute(path, self.mode) {
                Ok(sig) => sig,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    if old.is_some() {
                        diff.removed.push(path.clone());
                    }
                    continue;
                }
                Err(e) => {
                    tracing::debug!(
                        target: "bsync.cache",
                        path = %path.display(),
                        error = %e,
                        "signature unavailable"
                    );
                    if let Some(old) = old {
                        diff.state.entries.insert(path.clone(), *old);
                    }
                    diff.unreadable.push(path.clone());
                    continue;
                }
            };
            match old {
                None => diff.added.push(path.clone()),
                Some(old) if *old != sig => diff.updated.push(path.clone()),
                Some(_) => {}
            }
            diff.state.entries.insert(path.clone(), sig);
        }

        if let Some(previous) = previous {
            diff.removed.extend(
                previous
                    .entries
                    .keys()
                    .filter(|p| current.binary_search(p).is_err())
                    .cloned(),
            );
            diff.removed.sort();
        }

        Ok(diff)
    }
}
