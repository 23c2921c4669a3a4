//! Java source language levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Java source level, stored as its feature-release number.
///
/// Accepts both the legacy `1.N` spelling and plain `N` (`"1.8"` and `"8"`
/// are equal).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageLevel(u32);

/// Returned when a string is not a recognised Java version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a Java language level")]
pub struct InvalidLanguageLevel(pub String);

impl LanguageLevel {
    /// Level used when no target requests one.
    pub const BASELINE: LanguageLevel = LanguageLevel(7);

    /// Creates a level from a feature-release number.
    pub const fn new(release: u32) -> Self {
        Self(release)
    }

    /// Parses `"1.7"`, `"7"`, `"11"`, ...
    pub fn parse(s: &str) -> Result<Self, InvalidLanguageLevel> {
        let invalid = || InvalidLanguageLevel(s.to_string());
        let trimmed = s.trim();
        let release = match trimmed.strip_prefix("1.") {
            Some(legacy) => legacy.parse::<u32>().ok().filter(|n| (1..=9).contains(n)),
            None => trimmed.parse::<u32>().ok().filter(|n| *n >= 1),
        };
        release.map(Self).ok_or_else(invalid)
    }

    /// The feature-release number.
    pub fn release(self) -> u32 {
        self.0
    }
}

impl TryFrom<String> for LanguageLevel {
    type Error = InvalidLanguageLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LanguageLevel::parse(&value)
    }
}

impl From<LanguageLevel> for String {
    fn from(level: LanguageLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= 8 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageLevel({self})")
    }
}
