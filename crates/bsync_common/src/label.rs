//! Build target labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Errors produced when a string is not a well-formed target label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// The label string was empty.
    #[error("empty label")]
    Empty,

    /// The label does not start with `//` (after an optional `@repo`).
    #[error("label '{0}' must start with '//' or '@repo//'")]
    MissingWorkspacePrefix(String),

    /// The part after `:` is empty, or the shorthand form has no package.
    #[error("label '{0}' has an empty target name")]
    EmptyTargetName(String),

    /// The label contains a character that is never valid in a label.
    #[error("label '{label}' contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The offending label.
        label: String,
        /// The invalid character.
        ch: char,
    },
}

/// A globally unique identifier for one build target, e.g. `//java/com/app:app`.
///
/// Labels are stored in canonical form: the shorthand `//pkg/name` is
/// expanded to `//pkg/name:name`. Cloning is O(1).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(Arc<str>);

impl Label {
    /// Parses and canonicalizes a label.
    pub fn new(s: &str) -> Result<Self, LabelError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LabelError::Empty);
        }
        if let Some(ch) = s.chars().find(|c| c.is_whitespace() || *c == '\\') {
            return Err(LabelError::InvalidCharacter {
                label: s.to_string(),
                ch,
            });
        }

        let slashes = match s.strip_prefix('@') {
            Some(rest) => rest.find("//").map(|i| i + 1),
            None if s.starts_with("//") => Some(0),
            None => None,
        };
        let Some(slashes) = slashes else {
            return Err(LabelError::MissingWorkspacePrefix(s.to_string()));
        };

        let body = &s[slashes + 2..];
        match body.split_once(':') {
            Some((_, target)) if target.is_empty() => {
                Err(LabelError::EmptyTargetName(s.to_string()))
            }
            Some((_, target)) if target.contains(':') => Err(LabelError::InvalidCharacter {
                label: s.to_string(),
                ch: ':',
            }),
            Some(_) => Ok(Self(Arc::from(s))),
            None => {
                let name = body.rsplit('/').next().unwrap_or_default();
                if name.is_empty() {
                    return Err(LabelError::EmptyTargetName(s.to_string()));
                }
                Ok(Self(Arc::from(format!("{s}:{name}"))))
            }
        }
    }

    /// Returns the canonical label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the external repository name for `@repo//...` labels.
    pub fn repository(&self) -> Option<&str> {
        let rest = self.0.strip_prefix('@')?;
        rest.find("//").map(|i| &rest[..i])
    }

    /// Returns `true` for labels that refer to an external repository.
    pub fn is_external(&self) -> bool {
        self.repository().is_some_and(|repo| !repo.is_empty())
    }

    /// Returns the package path, e.g. `java/com/app` for `//java/com/app:app`.
    pub fn package(&self) -> &str {
        let start = self.0.find("//").map_or(0, |i| i + 2);
        let end = self.0.rfind(':').unwrap_or(self.0.len());
        &self.0[start..end]
    }

    /// Returns the target name, e.g. `app` for `//java/com/app:app`.
    pub fn target_name(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or_default()
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::new(&value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0.to_string()
    }
}

impl std::str::FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::new(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_label() {
        let l = Label::new("//java/com/app:app").unwrap();
        assert_eq!(l.as_str(), "//java/com/app:app");
        assert_eq!(l.package(), "java/com/app");
        assert_eq!(l.target_name(), "app");
        assert!(!l.is_external());
    }

    #[test]
    fn expands_shorthand() {
        let l = Label::new("//java/com/app").unwrap();
        assert_eq!(l.as_str(), "//java/com/app:app");
    }

    #[test]
    fn root_package_label() {
        let l = Label::new("//:all").unwrap();
        assert_eq!(l.package(), "");
        assert_eq!(l.target_name(), "all");
    }

    #[test]
    fn external_repository() {
        let l = Label::new("@maven//:com_google_guava_guava").unwrap();
        assert_eq!(l.repository(), Some("maven"));
        assert!(l.is_external());
        assert_eq!(l.package(), "");
        assert_eq!(l.target_name(), "com_google_guava_guava");
    }

    #[test]
    fn main_repository_alias_is_not_external() {
        let l = Label::new("@//x:y").unwrap();
        assert_eq!(l.repository(), Some(""));
        assert!(!l.is_external());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(Label::new(""), Err(LabelError::Empty));
        assert!(matches!(
            Label::new("java/com:app"),
            Err(LabelError::MissingWorkspacePrefix(_))
        ));
        assert!(matches!(
            Label::new("//java/com:"),
            Err(LabelError::EmptyTargetName(_))
        ));
        assert!(matches!(
            Label::new("//java com:app"),
            Err(LabelError::InvalidCharacter { ch: ' ', .. })
        ));
        assert!(matches!(Label::new("//"), Err(LabelError::EmptyTargetName(_))));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Label::new("//a:a").unwrap();
        let b = Label::new("//b:b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_validates() {
        let l: Label = serde_json::from_str("\"//x:y\"").unwrap();
        assert_eq!(l.as_str(), "//x:y");
        assert!(serde_json::from_str::<Label>("\"x:y\"").is_err());
        assert_eq!(serde_json::to_string(&l).unwrap(), "\"//x:y\"");
    }
}
