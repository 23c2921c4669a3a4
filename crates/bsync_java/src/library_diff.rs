//! Differences between the library sets of two syncs.

use crate::model::{BlazeLibrary, LibraryKey};
use std::collections::BTreeMap;

/// What the project model must do to go from one library set to another.
///
/// A library whose key is unchanged but whose jars differ is both removed
/// and added, so consumers never patch a library in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LibraryDiff {
    /// Libraries new or changed in this sync.
    pub to_add: Vec<BlazeLibrary>,
    /// Libraries gone or changed since the previous sync.
    pub to_remove: Vec<BlazeLibrary>,
    /// Libraries identical in both syncs.
    pub unchanged: Vec<BlazeLibrary>,
}

impl LibraryDiff {
    /// Compares `old` against `new`. All lists are ordered by key.
    pub fn diff(
        old: &BTreeMap<LibraryKey, BlazeLibrary>,
        new: &BTreeMap<LibraryKey, BlazeLibrary>,
    ) -> Self {
        let mut diff = Self::default();
        for (key, library) in new {
            match old.get(key) {
                Some(previous) if previous == library => diff.unchanged.push(library.clone()),
                Some(previous) => {
                    diff.to_remove.push(previous.clone());
                    diff.to_add.push(library.clone());
                }
                None => diff.to_add.push(library.clone()),
            }
        }
        diff.to_remove.extend(
            old.iter()
                .filter(|(key, _)| !new.contains_key(key))
                .map(|(_, library)| library.clone()),
        );
        diff.to_remove.sort_by(|a, b| a.key.cmp(&b.key));
        diff
    }

    /// Drops everything in `old` and adds everything in `new`.
    pub fn replace_all(
        old: &BTreeMap<LibraryKey, BlazeLibrary>,
        new: &BTreeMap<LibraryKey, BlazeLibrary>,
    ) -> Self {
        Self {
            to_add: new.values().cloned().collect(),
            to_remove: old.values().cloned().collect(),
            unchanged: Vec::new(),
        }
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
