//! Extension point for contributing and filtering libraries.

use crate::model::{BlazeLibrary, ImportResult};

/// Hooks run after the import, before exclusions are applied.
///
/// Augmenters are consulted in registration order. Contributed libraries
/// never replace an imported library with the same key.
pub trait SyncAugmenter: Send + Sync {
    /// Extra libraries to attach, e.g. SDK or annotation processor jars.
    fn contribute_libraries(&self, _result: &ImportResult) -> Vec<BlazeLibrary> {
        Vec::new()
    }

    /// Extra exclusion globs, matched like `java.exclude_library`.
    fn excluded_library_globs(&self) -> Vec<String> {
        Vec::new()
    }

    /// Returns `true` to drop `library` from the project.
    fn filter_library(&self, _library: &BlazeLibrary) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsync_ideinfo::{ArtifactLocation, LibraryArtifact};

    struct Nothing;
    impl SyncAugmenter for Nothing {}

    #[test]
    fn defaults_are_inert() {
        let lib = BlazeLibrary::new(LibraryArtifact::new(ArtifactLocation::source("a.jar")));
        assert!(Nothing.contribute_libraries(&ImportResult::default()).is_empty());
        assert!(Nothing.excluded_library_globs().is_empty());
        assert!(!Nothing.filter_library(&lib));
    }
}
