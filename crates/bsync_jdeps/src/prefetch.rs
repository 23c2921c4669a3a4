//! Making manifest files available before they are parsed.

use crate::error::PrefetchError;
use bsync_common::CancellationToken;
use std::path::PathBuf;

/// Bulk-fetches files that are about to be read.
///
/// Remote or lazily materialized output trees need files pulled down before
/// they can be parsed. A failure aborts the manifest reload for this sync.
pub trait Prefetcher: Send + Sync {
    /// Fetches every file in `files`.
    fn prefetch(&self, files: &[PathBuf], cancel: &CancellationToken) -> Result<(), PrefetchError>;
}

/// Prefetcher for output trees on local disk: nothing to fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPrefetcher;

impl Prefetcher for LocalPrefetcher {
    fn prefetch(&self, _files: &[PathBuf], cancel: &CancellationToken) -> Result<(), PrefetchError> {
        cancel.check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_prefetch_honours_cancellation() {
        let cancel = CancellationToken::new();
        assert!(LocalPrefetcher.prefetch(&[], &cancel).is_ok());
        cancel.cancel();
        assert!(matches!(
            LocalPrefetcher.prefetch(&[], &cancel),
            Err(PrefetchError::Cancelled(_))
        ));
    }
}
