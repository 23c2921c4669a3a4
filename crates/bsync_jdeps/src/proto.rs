//! Decoding of the compiler's `deps.proto` `Dependencies` message.
//!
//! ```text
//! message Dependency {
//!   required string path = 1;
//!   required Kind kind = 2;      // EXPLICIT = 0, IMPLICIT = 1, UNUSED = 2, INCOMPLETE = 3
//! }
//! message Dependencies {
//!   repeated Dependency dependency = 1;
//!   optional string rule_label = 2;
//!   optional bool success = 3;
//! }
//! ```

use crate::error::JdepsError;
use bsync_common::{WireError, WireReader, WireType};
use std::path::Path;

/// How a dependency was used by the compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyKind {
    /// Named in the source.
    #[default]
    Explicit,
    /// Needed transitively by the compiler.
    Implicit,
    /// On the classpath but never read.
    Unused,
    /// Read through an incomplete classpath entry.
    Incomplete,
}

impl DependencyKind {
    fn from_wire(value: u64) -> Self {
        match value {
            1 => DependencyKind::Implicit,
            2 => DependencyKind::Unused,
            3 => DependencyKind::Incomplete,
            _ => DependencyKind::Explicit,
        }
    }
}

/// One entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Execution-root-relative jar path.
    pub path: String,
    /// How the jar was used.
    pub kind: DependencyKind,
}

/// A decoded manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    /// The label the compiler recorded, if any.
    pub rule_label: Option<String>,
    /// Whether compilation succeeded.
    pub success: bool,
    /// Dependencies in file order.
    pub dependencies: Vec<Dependency>,
}

impl ParsedManifest {
    /// Decodes a `Dependencies` message.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(bytes);
        let mut manifest = ParsedManifest::default();
        while !reader.is_at_end() {
            match reader.read_key()? {
                (1, WireType::LengthDelimited) => {
                    manifest.dependencies.push(decode_dependency(reader.read_bytes()?)?);
                }
                (2, WireType::LengthDelimited) => {
                    manifest.rule_label = Some(reader.read_string()?.to_string());
                }
                (3, WireType::Varint) => manifest.success = reader.read_bool()?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(manifest)
    }

    /// Dependency paths in file order.
    pub fn paths(&self) -> Vec<String> {
        self.dependencies.iter().map(|d| d.path.clone()).collect()
    }
}

fn decode_dependency(bytes: &[u8]) -> Result<Dependency, WireError> {
    let mut reader = WireReader::new(bytes);
    let mut path = String::new();
    let mut kind = DependencyKind::default();
    while !reader.is_at_end() {
        match reader.read_key()? {
            (1, WireType::LengthDelimited) => path = reader.read_string()?.to_string(),
            (2, WireType::Varint) => kind = DependencyKind::from_wire(reader.read_varint()?),
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }
    Ok(Dependency { path, kind })
}

/// Parses one manifest file.
///
/// Called concurrently from the manifest pool.
pub trait ManifestParser: Send + Sync {
    /// Reads and decodes the manifest at `path`.
    fn parse(&self, path: &Path) -> Result<ParsedManifest, JdepsError>;
}

/// Reads manifests from disk as raw `Dependencies` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepsProtoParser;

impl ManifestParser for DepsProtoParser {
    fn parse(&self, path: &Path) -> Result<ParsedManifest, JdepsError> {
        let bytes = std::fs::read(path).map_err(|source| JdepsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ParsedManifest::decode(&bytes).map_err(|source| JdepsError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}
