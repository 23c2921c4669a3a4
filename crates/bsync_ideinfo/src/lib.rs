//! The build tool's view of a workspace, as handed to a sync.
//!
//! This crate holds the immutable value types the sync engine consumes:
//! [`ArtifactLocation`]s and [`LibraryArtifact`]s describing files the build
//! produced or read, per-target [`RuleIdeInfo`] keyed by [`Label`] in a
//! [`RuleMap`], the optional [`WorkingSet`] of locally modified files, and
//! the [`ArtifactLocationDecoder`] that turns locations into absolute paths.
//!
//! [`Label`]: bsync_common::Label

#![warn(missing_docs)]

pub mod artifact;
pub mod decoder;
pub mod error;
pub mod language_level;
pub mod rule;
pub mod rule_map;
pub mod workspace;

pub use artifact::{ArtifactLocation, LibraryArtifact};
pub use decoder::{ArtifactLocationDecoder, BlazeRoots};
pub use error::{ArtifactError, RuleMapError, WorkspacePathError};
pub use language_level::{InvalidLanguageLevel, LanguageLevel};
pub use rule::{JavaRuleIdeInfo, JavaToolchainIdeInfo, RuleIdeInfo, RuleKind, RulePayload};
pub use rule_map::{RuleMap, RuleMapBuilder, DUPLICATE_LABEL, MALFORMED_RULE};
pub use workspace::{WorkingSet, WorkspacePath, WorkspaceRoot};
