//! Compiled `exclude_library` patterns.

use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};

/// A set of glob patterns matched against execution-root-relative jar paths.
///
/// `*` does not cross `/`; use `**` to match any number of directories.
#[derive(Debug, Clone, Default)]
pub struct LibraryExclusions {
    patterns: Vec<Pattern>,
}

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl LibraryExclusions {
    /// Compiles every pattern, failing on the first invalid one.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Adds already-compiled patterns.
    pub fn extend(&mut self, other: LibraryExclusions) {
        self.patterns.extend(other.patterns);
    }

    /// Returns `true` if any pattern matches `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, OPTIONS))
    }

    /// The source text of each pattern, in insertion order.
    pub fn patterns(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Returns `true` if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_crosses_directories() {
        let ex = LibraryExclusions::compile(&["**/*-ijar.jar"]).unwrap();
        assert!(ex.matches("bazel-out/bin/java/libfoo-ijar.jar"));
        assert!(!ex.matches("bazel-out/bin/java/libfoo.jar"));
    }

    #[test]
    fn single_star_stays_in_segment() {
        let ex = LibraryExclusions::compile(&["third_party/*.jar"]).unwrap();
        assert!(ex.matches("third_party/guava.jar"));
        assert!(!ex.matches("third_party/google/guava.jar"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = LibraryExclusions::compile(&["a/[b"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { pattern, .. } if pattern == "a/[b"));
    }

    #[test]
    fn extend_merges() {
        let mut ex = LibraryExclusions::compile(&["a.jar"]).unwrap();
        ex.extend(LibraryExclusions::compile(&["b.jar"]).unwrap());
        assert_eq!(ex.patterns(), vec!["a.jar", "b.jar"]);
        assert!(ex.matches("b.jar"));
        assert!(LibraryExclusions::default().is_empty());
    }
}
