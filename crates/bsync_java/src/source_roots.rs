//! Source root inference.
//!
//! A Java file `java/com/app/Main.java` in package `com.app` implies the
//! package root `java`. Files whose directory does not mirror their package
//! get a source folder with an explicit package prefix instead. Roots nested
//! inside another root whose package layout already explains them are
//! merged away.

use bsync_ideinfo::WorkspacePath;
use std::collections::BTreeMap;

/// One Java source file of a content target.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// The file.
    pub path: WorkspacePath,
    /// Its package from the package manifest, when known.
    pub package: Option<String>,
    /// Whether the owning target is a test.
    pub is_test: bool,
}

/// An inferred source folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRoot {
    /// Package of files directly in the folder.
    pub package_prefix: String,
    /// `true` if only test targets contribute.
    pub is_test: bool,
}

/// Computes merged source roots for a set of files.
///
/// The result is keyed by directory. Files with a known package are placed
/// first; a file without one adds a folder only when no inferred root
/// already covers its directory.
pub fn calculate(files: &[SourceFile]) -> BTreeMap<WorkspacePath, SourceRoot> {
    let mut candidates: BTreeMap<WorkspacePath, SourceRoot> = BTreeMap::new();
    let mut unknown = Vec::new();

    for file in files {
        let Some(dir) = file.path.parent() else {
            continue;
        };
        match &file.package {
            Some(package) => {
                let (root, prefix) = root_for_package(&dir, package);
                add(&mut candidates, root, prefix, file.is_test);
            }
            None => unknown.push((dir, file.is_test)),
        }
    }

    for (dir, is_test) in unknown {
        match covering_root(&candidates, &dir) {
            Some(root) => {
                if let Some(existing) = candidates.get_mut(&root) {
                    existing.is_test &= is_test;
                }
            }
            None => add(&mut candidates, dir, String::new(), is_test),
        }
    }

    merge_nested(candidates)
}

fn add(roots: &mut BTreeMap<WorkspacePath, SourceRoot>, dir: WorkspacePath, prefix: String, is_test: bool) {
    match roots.get_mut(&dir) {
        Some(existing) => {
            if existing.package_prefix != prefix {
                tracing::debug!(
                    target: "bsync.java",
                    dir = %dir,
                    kept = %existing.package_prefix,
                    ignored = %prefix,
                    "conflicting package prefixes for one directory"
                );
            }
            existing.is_test &= is_test;
        }
        None => {
            roots.insert(
                dir,
                SourceRoot {
                    package_prefix: prefix,
                    is_test,
                },
            );
        }
    }
}

/// Splits `dir` into the package root and remaining prefix for `package`.
fn root_for_package(dir: &WorkspacePath, package: &str) -> (WorkspacePath, String) {
    if package.is_empty() {
        return (dir.clone(), String::new());
    }
    let package_path = package.replace('.', "/");
    let dir_str = dir.as_str();
    let root = if dir_str == package_path {
        Some("")
    } else {
        dir_str
            .strip_suffix(package_path.as_str())
            .and_then(|rest| rest.strip_suffix('/'))
    };
    match root.and_then(|r| WorkspacePath::new(r).ok()) {
        Some(root) => (root, String::new()),
        None => (dir.clone(), package.to_string()),
    }
}

/// The package `child` has when placed under `root` with `root_prefix`.
pub(crate) fn implied_package(root: &WorkspacePath, root_prefix: &str, child: &WorkspacePath) -> String {
    let rel = if root.is_root() {
        child.as_str()
    } else {
        child
            .as_str()
            .strip_prefix(root.as_str())
            .map_or("", |r| r.trim_start_matches('/'))
    };
    let rel = rel.replace('/', ".");
    match (root_prefix.is_empty(), rel.is_empty()) {
        (true, _) => rel,
        (_, true) => root_prefix.to_string(),
        _ => format!("{root_prefix}.{rel}"),
    }
}

fn covering_root(
    roots: &BTreeMap<WorkspacePath, SourceRoot>,
    dir: &WorkspacePath,
) -> Option<WorkspacePath> {
    roots.keys().filter(|root| root.is_ancestor_of(dir)).last().cloned()
}

fn merge_nested(candidates: BTreeMap<WorkspacePath, SourceRoot>) -> BTreeMap<WorkspacePath, SourceRoot> {
    let mut kept: BTreeMap<WorkspacePath, SourceRoot> = BTreeMap::new();
    for (dir, root) in candidates {
        let parent = kept
            .iter()
            .filter(|(k, _)| k.is_ancestor_of(&dir))
            .last()
            .map(|(k, r)| (k.clone(), r.package_prefix.clone()));
        if let Some((parent_dir, parent_prefix)) = parent {
            if implied_package(&parent_dir, &parent_prefix, &dir) == root.package_prefix {
                if let Some(p) = kept.get_mut(&parent_dir) {
                    p.is_test &= root.is_test;
                }
                continue;
            }
        }
        kept.insert(dir, root);
    }
    kept
}
