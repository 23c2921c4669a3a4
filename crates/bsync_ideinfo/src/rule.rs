//! Per-target metadata reported by the build tool.

use crate::artifact::{ArtifactLocation, LibraryArtifact};
use crate::error::ArtifactError;
use crate::language_level::LanguageLevel;
use bsync_common::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The rule class of a target, e.g. `java_library`.
///
/// Kinds are an open set: new rule classes appear without any change here,
/// and the importer decides what to do from the payload, not the kind.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleKind(String);

impl RuleKind {
    /// Creates a kind from its rule class name.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// The rule class name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for test rules (`java_test`, `android_robolectric_test`, ...).
    pub fn is_test(&self) -> bool {
        self.0.ends_with("_test")
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Java-specific output of a target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaRuleIdeInfo {
    /// The main jar(s). Usually one; `java_import` may list several.
    #[serde(default)]
    pub jars: Vec<LibraryArtifact>,
    /// Jars produced by annotation processing.
    #[serde(default)]
    pub generated_jars: Vec<LibraryArtifact>,
    /// File mapping each source file to its Java package.
    #[serde(default)]
    pub package_manifest: Option<ArtifactLocation>,
    /// Dependency manifest written by the compiler.
    #[serde(default)]
    pub jdeps: Option<ArtifactLocation>,
    /// `-source` level passed to javac, when set on the target.
    #[serde(default)]
    pub source_version: Option<LanguageLevel>,
}

/// Settings of a `java_toolchain` target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaToolchainIdeInfo {
    /// Default `-source` level for targets built with this toolchain.
    pub source_version: LanguageLevel,
    /// Default `-target` level.
    #[serde(default)]
    pub target_version: Option<LanguageLevel>,
}

/// Kind-specific payload of a target.
///
/// Consumers match the variants they understand and ignore the rest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePayload {
    /// Output of a Java compilation.
    Java(JavaRuleIdeInfo),
    /// A Java toolchain definition.
    JavaToolchain(JavaToolchainIdeInfo),
    /// A payload this version does not model; its fields are dropped.
    #[serde(other)]
    Unrecognized,
}

/// Everything the build reported about one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleIdeInfo {
    /// The target's label.
    pub label: Label,
    /// The rule class.
    pub kind: RuleKind,
    /// Declared source files.
    #[serde(default)]
    pub sources: Vec<ArtifactLocation>,
    /// Direct dependencies.
    #[serde(default)]
    pub dependencies: Vec<Label>,
    /// Kind-specific payload, when the build provided one.
    #[serde(default)]
    pub payload: Option<RulePayload>,
}

impl RuleIdeInfo {
    /// Creates a rule with no sources, dependencies, or payload.
    pub fn new(label: Label, kind: impl Into<String>) -> Self {
        Self {
            label,
            kind: RuleKind::new(kind),
            sources: Vec::new(),
            dependencies: Vec::new(),
            payload: None,
        }
    }

    /// Adds a declared source file.
    pub fn with_source(mut self, source: ArtifactLocation) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds a direct dependency.
    pub fn with_dependency(mut self, label: Label) -> Self {
        self.dependencies.push(label);
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: RulePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The Java payload, if this target has one.
    pub fn java(&self) -> Option<&JavaRuleIdeInfo> {
        match &self.payload {
            Some(RulePayload::Java(java)) => Some(java),
            _ => None,
        }
    }

    /// The toolchain payload, if this target is a Java toolchain.
    pub fn java_toolchain(&self) -> Option<&JavaToolchainIdeInfo> {
        match &self.payload {
            Some(RulePayload::JavaToolchain(toolchain)) => Some(toolchain),
            _ => None,
        }
    }

    /// Checks every artifact location the rule declares.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.sources.iter().try_for_each(ArtifactLocation::validate)?;
        if let Some(java) = self.java() {
            for jar in java.jars.iter().chain(&java.generated_jars) {
                jar.validate()?;
            }
            for loc in java.package_manifest.iter().chain(&java.jdeps) {
                loc.validate()?;
            }
        }
        Ok(())
    }
}
