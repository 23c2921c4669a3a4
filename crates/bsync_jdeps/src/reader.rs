//! The incremental manifest reader and its persisted state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bsync_cache::{FileDiffService, FileState};
use bsync_common::{CancellationToken, Cancelled, Label};
use bsync_diagnostics::{Diagnostic, DiagnosticSink};
use bsync_ideinfo::{ArtifactLocationDecoder, RuleMap};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codes;
use crate::error::{JdepsError, PrefetchError};
use crate::prefetch::Prefetcher;
use crate::proto::{ManifestParser, ParsedManifest};

/// Lookup from a target to the jars its compilation read.
pub trait JdepsMap {
    /// Execution-root-relative jar paths, or `None` if the target has no
    /// loaded manifest.
    fn dependencies(&self, label: &Label) -> Option<&[String]>;
}

impl JdepsMap for BTreeMap<Label, Vec<String>> {
    fn dependencies(&self, label: &Label) -> Option<&[String]> {
        self.get(label).map(Vec::as_slice)
    }
}

/// Manifest data carried from one sync to the next.
///
/// Every label in the dependency map was loaded from a file that is still
/// tracked in `file_state`; a file leaving the snapshot takes its label's
/// entry with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JdepsState {
    file_state: FileState,
    file_to_label: BTreeMap<PathBuf, Label>,
    label_to_jdeps: BTreeMap<Label, Vec<String>>,
}

impl JdepsState {
    /// The manifest snapshot.
    pub fn file_state(&self) -> &FileState {
        &self.file_state
    }

    /// The target each loaded manifest belongs to.
    pub fn file_to_label(&self) -> &BTreeMap<PathBuf, Label> {
        &self.file_to_label
    }

    /// Every loaded dependency list.
    pub fn label_to_jdeps(&self) -> &BTreeMap<Label, Vec<String>> {
        &self.label_to_jdeps
    }

    /// Dependencies of one target.
    pub fn get(&self, label: &Label) -> Option<&[String]> {
        self.label_to_jdeps.get(label).map(Vec::as_slice)
    }

    /// Number of targets with dependency data.
    pub fn len(&self) -> usize {
        self.label_to_jdeps.len()
    }

    /// Returns `true` if no dependency data is loaded.
    pub fn is_empty(&self) -> bool {
        self.label_to_jdeps.is_empty()
    }

    fn evict_file(&mut self, file: &Path) {
        if let Some(label) = self.file_to_label.remove(file) {
            self.label_to_jdeps.remove(&label);
        }
    }

    /// Moves entries of unchanged files to their current owners.
    ///
    /// Every moved entry is taken out before any is reinserted, so owners
    /// may trade files with each other.
    fn relabel(&mut self, owners: &BTreeMap<PathBuf, Label>) {
        let moved: Vec<(PathBuf, Label)> = owners
            .iter()
            .filter(|(file, owner)| {
                self.file_to_label
                    .get(*file)
                    .is_some_and(|old| old != *owner)
            })
            .map(|(file, owner)| (file.clone(), owner.clone()))
            .collect();
        let taken: Vec<(PathBuf, Label, Option<Vec<String>>)> = moved
            .into_iter()
            .map(|(file, owner)| {
                let deps = self
                    .file_to_label
                    .get(&file)
                    .and_then(|old| self.label_to_jdeps.remove(old));
                (file, owner, deps)
            })
            .collect();
        for (file, owner, deps) in taken {
            self.file_to_label.insert(file, owner.clone());
            match deps {
                Some(deps) => {
                    self.label_to_jdeps.insert(owner, deps);
                }
                None => {
                    self.label_to_jdeps.remove(&owner);
                }
            }
        }
    }

    fn record(&mut self, file: PathBuf, label: Label, dependencies: Vec<String>) {
        if let Some(old) = self.file_to_label.insert(file, label.clone()) {
            if old != label {
                self.label_to_jdeps.remove(&old);
            }
        }
        self.label_to_jdeps.insert(label, dependencies);
    }
}

impl JdepsMap for JdepsState {
    fn dependencies(&self, label: &Label) -> Option<&[String]> {
        self.get(label)
    }
}

/// Loads manifests incrementally.
pub struct JdepsFileReader<'a> {
    differ: FileDiffService,
    parser: &'a dyn ManifestParser,
    prefetcher: &'a dyn Prefetcher,
    pool: &'a rayon::ThreadPool,
}

struct Parsed {
    file: PathBuf,
    label: Label,
    outcome: Result<ParsedManifest, JdepsError>,
}

impl<'a> JdepsFileReader<'a> {
    /// Creates a reader with the given collaborators.
    ///
    /// Parsing runs on `pool`; the pool's size bounds parse concurrency.
    pub fn new(
        differ: FileDiffService,
        parser: &'a dyn ManifestParser,
        prefetcher: &'a dyn Prefetcher,
        pool: &'a rayon::ThreadPool,
    ) -> Self {
        Self {
            differ,
            parser,
            prefetcher,
            pool,
        }
    }

    /// Brings the manifest state up to date with `rule_map`.
    ///
    /// Returns `Ok(None)` when the prefetch fails; the caller then keeps its
    /// previous state. Individual files that cannot be read or decoded are
    /// skipped with a warning: the target keeps its previous dependencies and
    /// the file is retried next sync. `previous` is never modified.
    pub fn load(
        &self,
        rule_map: &RuleMap,
        decoder: &ArtifactLocationDecoder,
        previous: Option<&JdepsState>,
        sink: &DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<Option<JdepsState>, Cancelled> {
        let mut owners: BTreeMap<PathBuf, Label> = BTreeMap::new();
        for rule in rule_map {
            let Some(jdeps) = rule.java().and_then(|java| java.jdeps.as_ref()) else {
                continue;
            };
            owners
                .entry(decoder.decode(jdeps))
                .or_insert_with(|| rule.label.clone());
        }

        let previous_files = previous.map(|p| &p.file_state);
        let diff = self
            .differ
            .update_files(previous_files, owners.keys().cloned(), cancel)?;
        for path in &diff.unreadable {
            sink.emit(
                Diagnostic::warning(
                    codes::JDEPS_SIGNATURE_UNAVAILABLE,
                    "could not check dependency manifest for changes",
                )
                .for_file(path)
                .with_note("previously loaded dependencies are kept"),
            );
        }

        let to_parse: Vec<PathBuf> = diff.changed().cloned().collect();
        match self.prefetcher.prefetch(&to_parse, cancel) {
            Ok(()) => {}
            Err(PrefetchError::Cancelled(c)) => return Err(c),
            Err(PrefetchError::Failed { reason }) => {
                sink.emit(
                    Diagnostic::error(codes::PREFETCH_FAILED, "failed to fetch dependency manifests")
                        .with_note(reason)
                        .with_note("dependency data from the previous sync is kept"),
                );
                return Ok(None);
            }
        }

        let mut state = previous.cloned().unwrap_or_default();
        state.file_state = diff.state;
        for removed in &diff.removed {
            state.evict_file(removed);
        }
        state.relabel(&owners);

        let total_bytes = AtomicU64::new(0);
        let parsed: Vec<Parsed> = self.pool.install(|| {
            to_parse
                .par_iter()
                .filter(|_| !cancel.is_cancelled())
                .filter_map(|file| {
                    let label = owners.get(file)?.clone();
                    if let Ok(meta) = std::fs::metadata(file) {
                        total_bytes.fetch_add(meta.len(), Ordering::Relaxed);
                    }
                    Some(Parsed {
                        file: file.clone(),
                        label,
                        outcome: self.parser.parse(file),
                    })
                })
                .collect()
        });
        cancel.check()?;

        let mut loaded = 0usize;
        for Parsed {
            file,
            label,
            outcome,
        } in parsed
        {
            match outcome {
                Ok(manifest) => {
                    if let Some(recorded) = manifest.rule_label.as_deref() {
                        if recorded != label.as_str() {
                            tracing::debug!(
                                target: "bsync.jdeps",
                                %label,
                                recorded,
                                "manifest label differs from owning target"
                            );
                        }
                    }
                    state.record(file, label, manifest.paths());
                    loaded += 1;
                }
                Err(err) => {
                    let code = match err {
                        JdepsError::Io { .. } => codes::JDEPS_UNREADABLE,
                        JdepsError::Malformed { .. } => codes::JDEPS_MALFORMED,
                    };
                    sink.emit(
                        Diagnostic::warning(code, err.to_string())
                            .for_target(&label)
                            .with_note("previously loaded dependencies are kept"),
                    );
                    state.file_state.roll_back(&file, previous_files);
                }
            }
        }

        let kilobytes = total_bytes.load(Ordering::Relaxed) / 1024;
        sink.emit(Diagnostic::info(
            codes::JDEPS_LOADED,
            format!(
                "Loaded {} jdeps files, total size {}kB",
                to_parse.len(),
                kilobytes
            ),
        ));
        tracing::debug!(
            target: "bsync.jdeps",
            parsed = to_parse.len(),
            loaded,
            removed = diff.removed.len(),
            tracked = state.file_state.len(),
            "jdeps state updated"
        );
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefetch::LocalPrefetcher;
    use crate::proto::DepsProtoParser;
    use bsync_cache::SignatureMode;
    use bsync_common::WireWriter;
    use bsync_ideinfo::{
        ArtifactLocation, BlazeRoots, JavaRuleIdeInfo, RuleIdeInfo, RulePayload, WorkspaceRoot,
    };

    struct Fixture {
        dir: tempfile::TempDir,
        decoder: ArtifactLocationDecoder,
        pool: rayon::ThreadPool,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let decoder = ArtifactLocationDecoder::new(
                WorkspaceRoot::new(dir.path().join("ws")),
                BlazeRoots::new(dir.path().join("exec"), dir.path().join("base")),
            );
            let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
            Self { dir, decoder, pool }
        }

        fn write_jdeps(&self, name: &str, deps: &[&str]) {
            let mut writer = WireWriter::new();
            for dep in deps {
                let entry = WireWriter::new().string(1, dep).varint(2, 0).finish();
                writer.bytes(1, &entry);
            }
            let path = self.dir.path().join("exec/bin").join(format!("{name}.jdeps"));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, writer.finish()).unwrap();
        }

        fn load(&self, rules: &RuleMap, previous: Option<&JdepsState>, sink: &DiagnosticSink) -> Option<JdepsState> {
            let reader = JdepsFileReader::new(
                FileDiffService::new(SignatureMode::Content),
                &DepsProtoParser,
                &LocalPrefetcher,
                &self.pool,
            );
            reader
                .load(rules, &self.decoder, previous, sink, &CancellationToken::new())
                .unwrap()
        }
    }

    fn rule(name: &str) -> RuleIdeInfo {
        RuleIdeInfo::new(Label::new(&format!("//java:{name}")).unwrap(), "java_library")
            .with_payload(RulePayload::Java(JavaRuleIdeInfo {
                jdeps: Some(ArtifactLocation::generated("bin", format!("{name}.jdeps"))),
                ..Default::default()
            }))
    }

    fn rule_reading(name: &str, jdeps: &str) -> RuleIdeInfo {
        RuleIdeInfo::new(label(name), "java_library").with_payload(RulePayload::Java(
            JavaRuleIdeInfo {
                jdeps: Some(ArtifactLocation::generated("bin", format!("{jdeps}.jdeps"))),
                ..Default::default()
            },
        ))
    }

    fn label(name: &str) -> Label {
        Label::new(&format!("//java:{name}")).unwrap()
    }

    struct FailingPrefetcher;

    impl Prefetcher for FailingPrefetcher {
        fn prefetch(&self, _: &[PathBuf], _: &CancellationToken) -> Result<(), PrefetchError> {
            Err(PrefetchError::Failed {
                reason: "remote unavailable".into(),
            })
        }
    }

    #[test]
    fn loads_every_declared_manifest() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["out/libfoo.jar"]);
        fx.write_jdeps("b", &[]);
        let rules: RuleMap = [rule("a"), rule("b")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let state = fx.load(&rules, None, &sink).unwrap();
        assert_eq!(state.get(&label("a")), Some(&["out/libfoo.jar".to_string()][..]));
        assert_eq!(state.get(&label("b")), Some(&[][..]));
        assert_eq!(state.file_state().len(), 2);

        let stats = sink.take_all();
        assert!(stats
            .iter()
            .any(|d| d.code == codes::JDEPS_LOADED && d.message.starts_with("Loaded 2 jdeps files")));
    }

    #[test]
    fn removed_rule_evicts_label() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        fx.write_jdeps("b", &["y.jar"]);
        let sink = DiagnosticSink::new();
        let first = fx
            .load(&[rule("a"), rule("b")].into_iter().collect(), None, &sink)
            .unwrap();
        let second = fx
            .load(&[rule("a")].into_iter().collect(), Some(&first), &sink)
            .unwrap();
        assert!(second.get(&label("b")).is_none());
        assert_eq!(second.len(), 1);
        assert_eq!(second.file_to_label().len(), 1);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn moved_manifest_follows_its_new_owner() {
        let fx = Fixture::new();
        fx.write_jdeps("f1", &["one.jar"]);
        let sink = DiagnosticSink::new();
        let first = fx
            .load(&[rule_reading("a", "f1")].into_iter().collect(), None, &sink)
            .unwrap();

        let moved: RuleMap = [rule_reading("b", "f1")].into_iter().collect();
        let second = fx.load(&moved, Some(&first), &sink).unwrap();
        let fresh = fx.load(&moved, None, &sink).unwrap();
        assert!(second.get(&label("a")).is_none());
        assert_eq!(second.get(&label("b")), Some(&["one.jar".to_string()][..]));
        assert_eq!(second, fresh);
    }

    #[test]
    fn owners_trading_manifests_keep_both_entries() {
        let fx = Fixture::new();
        fx.write_jdeps("f1", &["one.jar"]);
        fx.write_jdeps("f2", &["two.jar"]);
        let sink = DiagnosticSink::new();
        let first = fx
            .load(
                &[rule_reading("a", "f1"), rule_reading("b", "f2")].into_iter().collect(),
                None,
                &sink,
            )
            .unwrap();

        let swapped: RuleMap = [rule_reading("a", "f2"), rule_reading("b", "f1")]
            .into_iter()
            .collect();
        let second = fx.load(&swapped, Some(&first), &sink).unwrap();
        let fresh = fx.load(&swapped, None, &sink).unwrap();
        assert_eq!(second.get(&label("a")), Some(&["two.jar".to_string()][..]));
        assert_eq!(second.get(&label("b")), Some(&["one.jar".to_string()][..]));
        assert_eq!(second.label_to_jdeps(), fresh.label_to_jdeps());
        assert_eq!(second.file_to_label(), fresh.file_to_label());
    }

    #[test]
    fn malformed_manifest_keeps_previous_entry_and_retries() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let first = fx.load(&rules, None, &sink).unwrap();

        std::fs::write(fx.dir.path().join("exec/bin/a.jdeps"), [0x0a, 0xff]).unwrap();
        let second = fx.load(&rules, Some(&first), &sink).unwrap();
        assert_eq!(second.get(&label("a")), Some(&["x.jar".to_string()][..]));
        assert_eq!(second.file_state(), first.file_state());
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::JDEPS_MALFORMED));

        fx.write_jdeps("a", &["z.jar"]);
        let third = fx.load(&rules, Some(&second), &sink).unwrap();
        assert_eq!(third.get(&label("a")), Some(&["z.jar".to_string()][..]));
    }

    #[test]
    fn missing_manifest_is_not_loaded() {
        let fx = Fixture::new();
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let state = fx.load(&rules, None, &sink).unwrap();
        assert!(state.is_empty());
        assert!(state.file_state().is_empty());
        assert_eq!(sink.warning_count(), 0);
        assert!(!sink.has_errors());
    }

    #[test]
    fn unreadable_signature_keeps_previous_entry() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let first = fx.load(&rules, None, &sink).unwrap();

        let path = fx.dir.path().join("exec/bin/a.jdeps");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        let second = fx.load(&rules, Some(&first), &sink).unwrap();
        assert_eq!(second.get(&label("a")), Some(&["x.jar".to_string()][..]));
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::JDEPS_SIGNATURE_UNAVAILABLE));
    }

    #[test]
    fn deleted_manifest_evicts_label() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let first = fx.load(&rules, None, &sink).unwrap();
        assert!(first.get(&label("a")).is_some());

        std::fs::remove_file(fx.dir.path().join("exec/bin/a.jdeps")).unwrap();
        let second = fx.load(&rules, Some(&first), &sink).unwrap();
        assert!(second.get(&label("a")).is_none());
        assert!(second.file_state().is_empty());
    }

    #[test]
    fn prefetch_failure_returns_none() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let sink = DiagnosticSink::new();
        let reader = JdepsFileReader::new(
            FileDiffService::default(),
            &DepsProtoParser,
            &FailingPrefetcher,
            &fx.pool,
        );
        let result = reader
            .load(&rules, &fx.decoder, None, &sink, &CancellationToken::new())
            .unwrap();
        assert!(result.is_none());
        assert!(sink.has_errors());
    }

    #[test]
    fn cancelled_load_commits_nothing() {
        let fx = Fixture::new();
        fx.write_jdeps("a", &["x.jar"]);
        let rules: RuleMap = [rule("a")].into_iter().collect();
        let reader = JdepsFileReader::new(
            FileDiffService::default(),
            &DepsProtoParser,
            &LocalPrefetcher,
            &fx.pool,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = reader.load(&rules, &fx.decoder, None, &DiagnosticSink::new(), &cancel);
        assert_eq!(result, Err(Cancelled));
    }

    #[test]
    fn btree_map_is_a_jdeps_map() {
        let mut map = BTreeMap::new();
        map.insert(label("a"), vec!["x.jar".to_string()]);
        assert_eq!(map.dependencies(&label("a")).map(<[String]>::len), Some(1));
        assert!(map.dependencies(&label("b")).is_none());
    }
}
