//! Error types for the Java sync.

use bsync_common::{Cancelled, WireError};
use bsync_config::ConfigError;
use std::path::PathBuf;

/// Errors that abort a sync. Everything scoped to one target or file is a
/// diagnostic instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The sync was cancelled; nothing was committed.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// The configuration handed to the engine is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure to read one package manifest.
#[derive(Debug, thiserror::Error)]
pub enum PackageManifestError {
    /// The file could not be read.
    #[error("could not read package manifest {path}: {source}")]
    Io {
        /// The manifest file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes are not a valid `PackageManifest` message.
    #[error("malformed package manifest {path}: {source}")]
    Malformed {
        /// The manifest file.
        path: PathBuf,
        /// The decoding error.
        source: WireError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_transparent() {
        assert_eq!(SyncError::from(Cancelled).to_string(), "sync cancelled");
    }

    #[test]
    fn package_manifest_io_display() {
        let err = PackageManifestError::Io {
            path: PathBuf::from("/exec/bin/app.manifest"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("app.manifest"));
    }
}
