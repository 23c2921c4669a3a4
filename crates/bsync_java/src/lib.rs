//! Java sync: turns the rule graph into a project model.
//!
//! [`JavaSyncEngine`] drives one sync. It refreshes dependency manifests
//! through the incremental reader, runs the [`JavaWorkspaceImporter`] over
//! the whole rule graph, applies library exclusions and [`SyncAugmenter`]
//! contributions, and diffs the resulting library list against the previous
//! sync with [`LibraryDiff`].

#![warn(missing_docs)]

pub mod augmenter;
pub mod codes;
pub mod error;
pub mod importer;
pub mod library_diff;
pub mod model;
pub mod package_manifest;
pub mod source_roots;
pub mod sync;
pub mod working_set;

pub use augmenter::SyncAugmenter;
pub use error::{PackageManifestError, SyncError};
pub use importer::JavaWorkspaceImporter;
pub use library_diff::LibraryDiff;
pub use model::{
    BlazeContentEntry, BlazeLibrary, BlazeSourceDirectory, ImportResult, JavaSyncData, LibraryKey,
};
pub use package_manifest::{JavaSourcePackage, PackageReader, ProtoPackageReader};
pub use sync::{JavaSyncEngine, SyncInput, SyncOutcome, SyncState};
pub use working_set::JavaWorkingSet;
