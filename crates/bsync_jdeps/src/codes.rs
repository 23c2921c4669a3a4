//! Diagnostic codes emitted while loading dependency manifests.

use bsync_diagnostics::{Category, DiagnosticCode};

/// A manifest file could not be read.
pub const JDEPS_UNREADABLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
/// A manifest file is not a valid `Dependencies` message.
pub const JDEPS_MALFORMED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
/// A manifest's signature could not be computed; its cached entry is kept.
pub const JDEPS_SIGNATURE_UNAVAILABLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);
/// Fetching manifests failed; the previous state is kept.
pub const PREFETCH_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
/// Load statistics.
pub const JDEPS_LOADED: DiagnosticCode = DiagnosticCode::new(Category::Info, 101);
