//! Error types for manifest loading.

use bsync_common::{Cancelled, WireError};
use std::path::PathBuf;

/// Failure to parse one manifest file.
///
/// Never fatal for a sync: the reader turns it into a diagnostic and keeps
/// the previous dependencies of the affected target.
#[derive(Debug, thiserror::Error)]
pub enum JdepsError {
    /// The file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// The manifest file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes are not a valid `Dependencies` message.
    #[error("malformed dependency manifest {path}: {source}")]
    Malformed {
        /// The manifest file.
        path: PathBuf,
        /// The decoding error.
        source: WireError,
    },
}

/// Failure to make manifest files locally available.
#[derive(Debug, thiserror::Error)]
pub enum PrefetchError {
    /// The fetch failed as a whole.
    #[error("prefetch failed: {reason}")]
    Failed {
        /// Description of the failure.
        reason: String,
    },

    /// The sync was cancelled while fetching.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
