//! Error types for the workspace model.

use std::path::PathBuf;

/// A workspace-relative path that cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspacePathError {
    /// The path is absolute.
    #[error("workspace path '{0}' must be relative")]
    Absolute(String),

    /// The path climbs out of the workspace with `..`.
    #[error("workspace path '{0}' must not contain '..'")]
    ParentReference(String),
}

/// An artifact location that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// The relative path is empty.
    #[error("artifact has an empty relative path")]
    EmptyPath,

    /// The relative path or root fragment is absolute.
    #[error("artifact path '{0}' must be relative")]
    AbsolutePath(String),

    /// The path climbs out of its root with `..`.
    #[error("artifact path '{0}' must not contain '..'")]
    ParentReference(String),
}

/// Errors that prevent a rule map from being enumerated at all.
///
/// Problems with individual rules are not errors; those rules are skipped
/// with a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum RuleMapError {
    /// The rule map file could not be read.
    #[error("failed to read rule map {path}: {source}")]
    Io {
        /// The rule map file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not a JSON array of rule objects.
    #[error("rule map is not a JSON array of rules: {reason}")]
    Malformed {
        /// Description of the parse failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_map_io_display() {
        let err = RuleMapError::Io {
            path: PathBuf::from("/tmp/rules.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/rules.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn artifact_error_display() {
        assert_eq!(
            ArtifactError::AbsolutePath("/x.jar".into()).to_string(),
            "artifact path '/x.jar' must be relative"
        );
    }
}
