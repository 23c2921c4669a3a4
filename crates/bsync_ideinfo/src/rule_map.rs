//! The rule graph: every target the build reported, keyed by label.

use crate::error::RuleMapError;
use crate::rule::RuleIdeInfo;
use bsync_common::Label;
use bsync_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

/// A rule object in the rule map could not be decoded or validated.
pub const MALFORMED_RULE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
/// Two rule objects share a label.
pub const DUPLICATE_LABEL: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);

/// Ordered, read-only mapping from label to rule.
///
/// Iteration is in label order, which every consumer relies on for
/// deterministic output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleMap {
    rules: BTreeMap<Label, RuleIdeInfo>,
}

impl RuleMap {
    /// Returns the rule for `label`.
    pub fn get(&self, label: &Label) -> Option<&RuleIdeInfo> {
        self.rules.get(label)
    }

    /// Returns `true` if the map has a rule for `label`.
    pub fn contains(&self, label: &Label) -> bool {
        self.rules.contains_key(label)
    }

    /// Iterates rules in label order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleIdeInfo> {
        self.rules.values()
    }

    /// Iterates labels in order.
    pub fn labels(&self) -> btree_map::Keys<'_, Label, RuleIdeInfo> {
        self.rules.keys()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the map has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parses a JSON array of rule objects.
    ///
    /// Only a document that is not a JSON array fails. Each element that does
    /// not decode or validate is skipped with a [`MALFORMED_RULE`] warning,
    /// and later duplicates of a label are dropped with [`DUPLICATE_LABEL`].
    pub fn from_json(json: &str, sink: &DiagnosticSink) -> Result<Self, RuleMapError> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| RuleMapError::Malformed {
                reason: e.to_string(),
            })?;

        let mut builder = RuleMapBuilder::new();
        for (index, value) in values.into_iter().enumerate() {
            let raw_label = value
                .get("label")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);
            let rule = match serde_json::from_value::<RuleIdeInfo>(value) {
                Ok(rule) => rule,
                Err(e) => {
                    sink.emit(malformed(index, raw_label.as_deref(), e.to_string()));
                    continue;
                }
            };
            if let Err(e) = rule.validate() {
                sink.emit(
                    Diagnostic::warning(MALFORMED_RULE, format!("skipping rule: {e}"))
                        .for_target(&rule.label),
                );
                continue;
            }
            let label = rule.label.clone();
            if !builder.insert(rule) {
                sink.emit(
                    Diagnostic::warning(DUPLICATE_LABEL, "duplicate rule ignored")
                        .for_target(&label)
                        .with_note("the first rule with this label is kept"),
                );
            }
        }

        let map = builder.build();
        tracing::debug!(target: "bsync.ideinfo", rules = map.len(), "rule map parsed");
        Ok(map)
    }

    /// Reads and parses a rule map file. See [`RuleMap::from_json`].
    pub fn load(path: &Path, sink: &DiagnosticSink) -> Result<Self, RuleMapError> {
        let json = std::fs::read_to_string(path).map_err(|source| RuleMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, sink)
    }
}

impl<'a> IntoIterator for &'a RuleMap {
    type Item = &'a RuleIdeInfo;
    type IntoIter = btree_map::Values<'a, Label, RuleIdeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.values()
    }
}

impl FromIterator<RuleIdeInfo> for RuleMap {
    fn from_iter<I: IntoIterator<Item = RuleIdeInfo>>(iter: I) -> Self {
        let mut builder = RuleMapBuilder::new();
        for rule in iter {
            builder.insert(rule);
        }
        builder.build()
    }
}

fn malformed(index: usize, label: Option<&str>, reason: String) -> Diagnostic {
    let diag = Diagnostic::warning(MALFORMED_RULE, format!("skipping rule #{index}: {reason}"));
    match label.map(Label::new) {
        Some(Ok(label)) => diag.for_target(&label),
        Some(Err(_)) | None => diag,
    }
}

/// Accumulates rules before freezing them into a [`RuleMap`].
#[derive(Debug, Default)]
pub struct RuleMapBuilder {
    rules: BTreeMap<Label, RuleIdeInfo>,
}

impl RuleMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. Returns `false`, keeping the existing rule, if the label
    /// is already present.
    pub fn insert(&mut self, rule: RuleIdeInfo) -> bool {
        match self.rules.entry(rule.label.clone()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(rule);
                true
            }
        }
    }

    /// Freezes the builder.
    pub fn build(self) -> RuleMap {
        RuleMap { rules: self.rules }
    }
}
