//! Diagnostic codes emitted by the importer and the sync engine.

use bsync_diagnostics::{Category, DiagnosticCode};

/// A rule could not be imported and was skipped.
pub const RULE_SKIPPED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
/// A package manifest could not be read; directories are used instead.
pub const PACKAGE_MANIFEST_UNREADABLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);
/// Two targets produced different libraries with the same identity.
pub const LIBRARY_CONFLICT: DiagnosticCode = DiagnosticCode::new(Category::Info, 201);
/// Duration of one sync phase.
pub const PHASE_TIMING: DiagnosticCode = DiagnosticCode::new(Category::Info, 202);
/// A deploy jar is attached as a library.
pub const DEPLOY_JAR_LIBRARY: DiagnosticCode = DiagnosticCode::new(Category::Performance, 301);
/// Source jars are attached to every library.
pub const SOURCE_JARS_BY_DEFAULT: DiagnosticCode = DiagnosticCode::new(Category::Performance, 302);
/// Library state from the previous sync was discarded.
pub const PREVIOUS_LIBRARIES_DISCARDED: DiagnosticCode = DiagnosticCode::new(Category::Info, 401);
