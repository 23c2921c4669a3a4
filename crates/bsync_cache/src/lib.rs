//! Cross-run state for incremental syncs.
//!
//! [`FileDiffService`] decides which files changed since the previous sync by
//! comparing a fresh [`FileState`] snapshot against the stored one, and
//! [`StateStore`] persists the engine's state between invocations as a single
//! versioned, checksummed binary file.

#![warn(missing_docs)]

pub mod error;
pub mod filediff;
pub mod store;

pub use error::CacheError;
pub use filediff::{FileDiff, FileDiffService, FileSignature, FileState, SignatureMode};
pub use store::{StateHeader, StateStore, STATE_FILE_NAME, STATE_SCHEMA_VERSION};
