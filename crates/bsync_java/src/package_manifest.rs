//! Package manifests: the Java package of each source file of a target.
//!
//! ```text
//! message PackageManifest { repeated JavaSourcePackage sources = 1; }
//! message JavaSourcePackage {
//!   string package_string = 2;
//!   ArtifactLocation artifact_location = 3;
//! }
//! message ArtifactLocation {
//!   string root_execution_path_fragment = 1;
//!   string relative_path = 2;
//!   bool is_source = 3;
//! }
//! ```

use crate::error::PackageManifestError;
use bsync_common::{WireError, WireReader, WireType};
use bsync_ideinfo::ArtifactLocation;
use std::path::Path;

/// One source file and its package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JavaSourcePackage {
    /// Dotted package name, e.g. `com.google.app`.
    pub package: String,
    /// The source file.
    pub location: ArtifactLocation,
}

/// Reads package manifest files.
///
/// Called concurrently from the sync's thread pool.
pub trait PackageReader: Send + Sync {
    /// Reads the manifest at `path`.
    fn read(&self, path: &Path) -> Result<Vec<JavaSourcePackage>, PackageManifestError>;
}

/// Reads manifests from disk as raw `PackageManifest` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoPackageReader;

impl PackageReader for ProtoPackageReader {
    fn read(&self, path: &Path) -> Result<Vec<JavaSourcePackage>, PackageManifestError> {
        let bytes = std::fs::read(path).map_err(|source| PackageManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode_manifest(&bytes).map_err(|source| PackageManifestError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Decodes a `PackageManifest` message.
pub fn decode_manifest(bytes: &[u8]) -> Result<Vec<JavaSourcePackage>, WireError> {
    let mut reader = WireReader::new(bytes);
    let mut sources = Vec::new();
    while !reader.is_at_end() {
        match reader.read_key()? {
            (1, WireType::LengthDelimited) => sources.push(decode_package(reader.read_bytes()?)?),
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }
    Ok(sources)
}

fn decode_package(bytes: &[u8]) -> Result<JavaSourcePackage, WireError> {
    let mut reader = WireReader::new(bytes);
    let mut package = String::new();
    let mut location = ArtifactLocation::source("");
    while !reader.is_at_end() {
        match reader.read_key()? {
            (2, WireType::LengthDelimited) => package = reader.read_string()?.to_string(),
            (3, WireType::LengthDelimited) => location = decode_location(reader.read_bytes()?)?,
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }
    Ok(JavaSourcePackage { package, location })
}

fn decode_location(bytes: &[u8]) -> Result<ArtifactLocation, WireError> {
    let mut reader = WireReader::new(bytes);
    let mut root = String::new();
    let mut relative = String::new();
    let mut is_source = false;
    while !reader.is_at_end() {
        match reader.read_key()? {
            (1, WireType::LengthDelimited) => root = reader.read_string()?.to_string(),
            (2, WireType::LengthDelimited) => relative = reader.read_string()?.to_string(),
            (3, WireType::Varint) => is_source = reader.read_bool()?,
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }
    Ok(ArtifactLocation {
        root_execution_path_fragment: root,
        relative_path: relative,
        is_source,
    })
}
