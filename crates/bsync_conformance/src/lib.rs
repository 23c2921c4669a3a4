//! Fixtures for end-to-end sync scenarios.
//!
//! A [`Fixture`] is a throwaway workspace with an execution root and an
//! output base. Tests write manifests into it, build rule graphs with the
//! helpers below and run syncs through [`Fixture::sync`].

#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bsync_common::{CancellationToken, Label, WireWriter};
use bsync_config::{ManifestSignature, SyncConfig};
use bsync_diagnostics::{Diagnostic, DiagnosticSink};
use bsync_ideinfo::{
    ArtifactLocation, ArtifactLocationDecoder, BlazeRoots, JavaRuleIdeInfo, LibraryArtifact,
    RuleIdeInfo, RulePayload, WorkingSet, WorkspacePath, WorkspaceRoot,
};
use bsync_jdeps::{DepsProtoParser, JdepsError, ManifestParser, ParsedManifest};
use bsync_java::{JavaSyncEngine, SyncError, SyncInput, SyncOutcome, SyncState};

pub use bsync_ideinfo::RuleMap;

/// Root fragment of generated artifacts in fixtures.
pub const BIN: &str = "bazel-out/bin";

/// Parses a label, panicking on malformed input.
pub fn label(s: &str) -> Label {
    Label::new(s).unwrap()
}

/// Parses a workspace path, panicking on malformed input.
pub fn wp(s: &str) -> WorkspacePath {
    WorkspacePath::new(s).unwrap()
}

/// A `java_library` with workspace sources and a generated jar.
pub fn java_library(name: &str, sources: &[&str], jar: &str) -> RuleIdeInfo {
    let mut rule = RuleIdeInfo::new(label(name), "java_library");
    for source in sources {
        rule = rule.with_source(ArtifactLocation::source(*source));
    }
    rule.with_payload(RulePayload::Java(JavaRuleIdeInfo {
        jars: vec![LibraryArtifact::new(ArtifactLocation::generated(BIN, jar))],
        ..Default::default()
    }))
}

/// A `java_import` of a jar checked into the workspace.
pub fn java_import(name: &str, jar: &str) -> RuleIdeInfo {
    RuleIdeInfo::new(label(name), "java_import").with_payload(RulePayload::Java(
        JavaRuleIdeInfo {
            jars: vec![LibraryArtifact::new(ArtifactLocation::source(jar))],
            ..Default::default()
        },
    ))
}

/// Sets the dependency manifest of a Java rule.
pub fn with_jdeps(mut rule: RuleIdeInfo, jdeps: ArtifactLocation) -> RuleIdeInfo {
    if let Some(RulePayload::Java(java)) = &mut rule.payload {
        java.jdeps = Some(jdeps);
    }
    rule
}

/// Builds a rule map, dropping nothing.
pub fn rules(rules: impl IntoIterator<Item = RuleIdeInfo>) -> RuleMap {
    rules.into_iter().collect()
}

/// Encodes a `Dependencies` message listing `paths` as explicit deps.
pub fn encode_deps(rule_label: &str, paths: &[&str]) -> Vec<u8> {
    let mut writer = WireWriter::new();
    for path in paths {
        let dependency = WireWriter::new().string(1, path).varint(2, 0).finish();
        writer.bytes(1, &dependency);
    }
    writer.string(2, rule_label).bool(3, true).finish()
}

/// Everything one sync produced.
pub struct SyncRun {
    /// The outcome, or the error that aborted the sync.
    pub result: Result<SyncOutcome, SyncError>,
    /// Diagnostics emitted during the sync.
    pub diagnostics: Vec<Diagnostic>,
}

impl SyncRun {
    /// The outcome of a sync expected to succeed.
    pub fn outcome(&self) -> &SyncOutcome {
        match &self.result {
            Ok(outcome) => outcome,
            Err(e) => panic!("sync failed: {e}"),
        }
    }

    /// The state of a sync expected to succeed.
    pub fn state(&self) -> &SyncState {
        &self.outcome().state
    }

    /// Number of diagnostics with `code`'s textual form, e.g. `"W101"`.
    pub fn count(&self, code: &str) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.code.to_string() == code)
            .count()
    }
}

/// A temporary workspace with build output directories.
pub struct Fixture {
    dir: tempfile::TempDir,
    /// Configuration used for engines built by [`Fixture::engine`].
    pub config: SyncConfig,
}

impl Fixture {
    /// Creates a fixture comparing manifests by content, so rewrites within
    /// one timestamp tick are still seen.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["workspace", "execroot", "output_base"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let mut config = SyncConfig::default();
        config.sync.manifest_signature = ManifestSignature::Content;
        Self { dir, config }
    }

    /// The workspace root.
    pub fn workspace(&self) -> PathBuf {
        self.dir.path().join("workspace")
    }

    /// The execution root.
    pub fn execution_root(&self) -> PathBuf {
        self.dir.path().join("execroot")
    }

    /// A state directory outside the workspace.
    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Decoder for this fixture's directories.
    pub fn decoder(&self) -> ArtifactLocationDecoder {
        ArtifactLocationDecoder::new(
            WorkspaceRoot::new(self.workspace()),
            BlazeRoots::new(self.execution_root(), self.dir.path().join("output_base")),
        )
    }

    /// Writes a dependency manifest under the execution root and returns
    /// its location.
    pub fn write_jdeps(&self, relative_path: &str, rule_label: &str, deps: &[&str]) -> ArtifactLocation {
        let location = ArtifactLocation::generated(BIN, relative_path);
        self.write_generated(&location, &encode_deps(rule_label, deps));
        location
    }

    /// Writes raw bytes to a generated artifact.
    pub fn write_generated(&self, location: &ArtifactLocation, bytes: &[u8]) {
        let path = self.decoder().decode(location);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, bytes).unwrap();
    }

    /// Deletes a generated artifact.
    pub fn remove_generated(&self, location: &ArtifactLocation) {
        std::fs::remove_file(self.decoder().decode(location)).unwrap();
    }

    /// An engine over the fixture's config with a small pool.
    pub fn engine(&self) -> JavaSyncEngine {
        JavaSyncEngine::new(self.config.clone(), pool()).unwrap()
    }

    /// Runs one sync with a fresh default engine.
    pub fn sync(&self, rule_map: &RuleMap, previous: Option<&SyncState>) -> SyncRun {
        self.sync_with(&self.engine(), rule_map, None, previous)
    }

    /// Runs one sync with `engine` and an optional working set.
    pub fn sync_with(
        &self,
        engine: &JavaSyncEngine,
        rule_map: &RuleMap,
        working_set: Option<&WorkingSet>,
        previous: Option<&SyncState>,
    ) -> SyncRun {
        let decoder = self.decoder();
        let sink = DiagnosticSink::new();
        let input = SyncInput {
            rule_map,
            decoder: &decoder,
            working_set,
        };
        let result = engine.sync(input, previous, &sink, &CancellationToken::new());
        SyncRun {
            result,
            diagnostics: sink.take_all(),
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-thread pool for fixture engines.
pub fn pool() -> Arc<rayon::ThreadPool> {
    Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap(),
    )
}

/// Serializes a state the way the state store does.
pub fn state_bytes(state: &SyncState) -> Vec<u8> {
    bincode::serde::encode_to_vec(state, bincode::config::standard()).unwrap()
}

/// A manifest parser that records every file it is asked to parse.
#[derive(Clone, Default)]
pub struct RecordingParser {
    calls: Arc<AtomicUsize>,
    parsed: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingParser {
    /// Number of parse calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Files parsed so far, sorted.
    pub fn parsed(&self) -> Vec<PathBuf> {
        let mut files = self.parsed.lock().unwrap().clone();
        files.sort();
        files
    }

    /// Forgets previous calls.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.parsed.lock().unwrap().clear();
    }
}

impl ManifestParser for RecordingParser {
    fn parse(&self, path: &Path) -> Result<ParsedManifest, JdepsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.parsed.lock().unwrap().push(path.to_path_buf());
        DepsProtoParser.parse(path)
    }
}
