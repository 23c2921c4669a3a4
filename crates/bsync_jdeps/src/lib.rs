//! Incremental loading of per-target dependency manifests (`.jdeps` files).
//!
//! The compiler writes one manifest per Java target listing the jars that
//! compilation actually read. [`JdepsFileReader`] keeps a [`JdepsState`]
//! across syncs and re-parses only the manifests whose signature changed,
//! fanning the parsing out over a caller-provided thread pool.

#![warn(missing_docs)]

pub mod codes;
pub mod error;
pub mod prefetch;
pub mod proto;
pub mod reader;

pub use error::{JdepsError, PrefetchError};
pub use prefetch::{LocalPrefetcher, Prefetcher};
pub use proto::{DepsProtoParser, Dependency, DependencyKind, ManifestParser, ParsedManifest};
pub use reader::{JdepsFileReader, JdepsMap, JdepsState};
