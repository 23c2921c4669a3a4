//! The sync engine.
//!
//! A sync is a pure function of its inputs and the previous [`SyncState`]:
//! the engine never mutates the previous state and commits nothing until the
//! whole pipeline has run. Cancellation is checked between phases; a
//! cancelled sync returns [`SyncError::Cancelled`] and no state.

use std::collections::{btree_map, BTreeMap};
use std::sync::Arc;
use std::time::Instant;

use bsync_cache::{FileDiffService, SignatureMode};
use bsync_common::{CancellationToken, Label};
use bsync_config::{LibraryExclusions, ManifestSignature, SyncConfig};
use bsync_diagnostics::{Diagnostic, DiagnosticSink};
use bsync_ideinfo::{ArtifactLocationDecoder, LanguageLevel, RuleMap, WorkingSet};
use bsync_jdeps::{
    DepsProtoParser, JdepsFileReader, JdepsMap, JdepsState, LocalPrefetcher, ManifestParser,
    Prefetcher,
};
use serde::{Deserialize, Serialize};

use crate::augmenter::SyncAugmenter;
use crate::codes;
use crate::error::SyncError;
use crate::importer::JavaWorkspaceImporter;
use crate::library_diff::LibraryDiff;
use crate::model::{BlazeLibrary, ImportResult, JavaSyncData, LibraryKey};
use crate::package_manifest::{PackageReader, ProtoPackageReader};
use crate::working_set::JavaWorkingSet;

const DEPLOY_JAR_SUFFIXES: [&str; 3] = ["deploy.jar", "deploy-ijar.jar", "deploy-hjar.jar"];

/// The inputs of one sync, besides configuration and the previous state.
#[derive(Clone, Copy)]
pub struct SyncInput<'a> {
    /// The rule graph reported by the build.
    pub rule_map: &'a RuleMap,
    /// Resolves artifact locations to files.
    pub decoder: &'a ArtifactLocationDecoder,
    /// Locally changed files, if version control reported any.
    pub working_set: Option<&'a WorkingSet>,
}

/// Everything carried from one sync to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Loaded dependency manifests.
    pub jdeps: Option<JdepsState>,
    /// The Java project model.
    pub java: Option<JavaSyncData>,
}

/// The result of a successful sync.
#[derive(Clone, Debug)]
pub struct SyncOutcome {
    /// State to persist and hand to the next sync.
    pub state: SyncState,
    /// Library changes relative to the previous sync.
    pub library_diff: LibraryDiff,
    /// Language level for the project.
    pub language_level: LanguageLevel,
    /// `false` if manifest loading failed and the previous manifests were
    /// reused.
    pub jdeps_reloaded: bool,
}

/// Runs Java syncs with a fixed configuration.
pub struct JavaSyncEngine {
    config: SyncConfig,
    exclusions: LibraryExclusions,
    pool: Arc<rayon::ThreadPool>,
    augmenters: Vec<Box<dyn SyncAugmenter>>,
    prefetcher: Box<dyn Prefetcher>,
    parser: Box<dyn ManifestParser>,
    package_reader: Box<dyn PackageReader>,
}

impl JavaSyncEngine {
    /// Creates an engine. Fails if an exclusion glob does not compile.
    ///
    /// Manifest parsing and package reading run on `pool`.
    pub fn new(config: SyncConfig, pool: Arc<rayon::ThreadPool>) -> Result<Self, SyncError> {
        let exclusions = LibraryExclusions::compile(&config.java.exclude_library)?;
        Ok(Self {
            config,
            exclusions,
            pool,
            augmenters: Vec::new(),
            prefetcher: Box::new(LocalPrefetcher),
            parser: Box::new(DepsProtoParser),
            package_reader: Box::new(ProtoPackageReader),
        })
    }

    /// Registers an augmenter. Augmenters run in registration order.
    pub fn with_augmenter(mut self, augmenter: Box<dyn SyncAugmenter>) -> Self {
        self.augmenters.push(augmenter);
        self
    }

    /// Replaces the manifest prefetcher.
    pub fn with_prefetcher(mut self, prefetcher: Box<dyn Prefetcher>) -> Self {
        self.prefetcher = prefetcher;
        self
    }

    /// Replaces the dependency manifest parser.
    pub fn with_manifest_parser(mut self, parser: Box<dyn ManifestParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the package manifest reader.
    pub fn with_package_reader(mut self, reader: Box<dyn PackageReader>) -> Self {
        self.package_reader = reader;
        self
    }

    /// The configuration in effect.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs one sync.
    pub fn sync(
        &self,
        input: SyncInput<'_>,
        previous: Option<&SyncState>,
        sink: &DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome, SyncError> {
        cancel.check()?;
        let working_set = input
            .working_set
            .filter(|_| self.config.sync.use_working_set)
            .map(JavaWorkingSet::new);

        let started = Instant::now();
        let previous_jdeps = previous.and_then(|p| p.jdeps.as_ref());
        let reader = JdepsFileReader::new(
            FileDiffService::new(self.signature_mode()),
            self.parser.as_ref(),
            self.prefetcher.as_ref(),
            &self.pool,
        );
        let loaded = reader.load(input.rule_map, input.decoder, previous_jdeps, sink, cancel)?;
        let jdeps_reloaded = loaded.is_some();
        let jdeps = loaded.or_else(|| previous_jdeps.cloned());
        phase_timing(sink, "LoadJdepsFiles", started);
        cancel.check()?;

        let started = Instant::now();
        let no_jdeps: BTreeMap<Label, Vec<String>> = BTreeMap::new();
        let jdeps_map: &dyn JdepsMap = match &jdeps {
            Some(state) => state,
            None => &no_jdeps,
        };
        let import_result =
            JavaWorkspaceImporter::new(input.rule_map, jdeps_map, working_set.as_ref(), input.decoder)
                .with_project(&self.config.project)
                .with_package_reader(self.package_reader.as_ref())
                .with_pool(&self.pool)
                .prune_unused_libraries(self.config.sync.prune_unused_libraries)
                .import(sink);
        phase_timing(sink, "JavaWorkspaceImporter", started);
        cancel.check()?;

        let mut exclusions = self.exclusions.clone();
        for augmenter in &self.augmenters {
            exclusions.extend(LibraryExclusions::compile(&augmenter.excluded_library_globs())?);
        }
        let attached_libraries = self.attach_libraries(&import_result, &exclusions);
        let attach_source_jars_by_default = self.config.java.attach_source_jars_by_default;
        if attach_source_jars_by_default {
            sink.emit(
                Diagnostic::warning(
                    codes::SOURCE_JARS_BY_DEFAULT,
                    "source jars are attached to every library",
                )
                .with_help("attach source jars on demand to speed up indexing"),
            );
        }

        let previous_java = previous.and_then(|p| p.java.as_ref());
        let library_diff = match previous_java {
            Some(old) if old.attach_source_jars_by_default != attach_source_jars_by_default => {
                sink.emit(Diagnostic::info(
                    codes::PREVIOUS_LIBRARIES_DISCARDED,
                    "source jar setting changed; all libraries are refreshed",
                ));
                LibraryDiff::replace_all(&old.attached_libraries, &attached_libraries)
            }
            Some(old) => LibraryDiff::diff(&old.attached_libraries, &attached_libraries),
            None => LibraryDiff::diff(&BTreeMap::new(), &attached_libraries),
        };

        let language_level = self
            .config
            .java
            .language_level
            .or(import_result.source_version)
            .unwrap_or(LanguageLevel::BASELINE);

        warn_deploy_jars(&import_result, sink);
        cancel.check()?;

        tracing::info!(
            target: "bsync.java",
            added = library_diff.to_add.len(),
            removed = library_diff.to_remove.len(),
            unchanged = library_diff.unchanged.len(),
            %language_level,
            "sync finished"
        );

        Ok(SyncOutcome {
            state: SyncState {
                jdeps,
                java: Some(JavaSyncData {
                    import_result,
                    excluded_libraries: exclusions.patterns(),
                    attach_source_jars_by_default,
                    attached_libraries,
                }),
            },
            library_diff,
            language_level,
            jdeps_reloaded,
        })
    }

    fn signature_mode(&self) -> SignatureMode {
        match self.config.sync.manifest_signature {
            ManifestSignature::Metadata => SignatureMode::Metadata,
            ManifestSignature::Content => SignatureMode::Content,
        }
    }

    fn attach_libraries(
        &self,
        import_result: &ImportResult,
        exclusions: &LibraryExclusions,
    ) -> BTreeMap<LibraryKey, BlazeLibrary> {
        let mut libraries = import_result.libraries.clone();
        for augmenter in &self.augmenters {
            for library in augmenter.contribute_libraries(import_result) {
                if let btree_map::Entry::Vacant(slot) = libraries.entry(library.key.clone()) {
                    slot.insert(library);
                }
            }
        }
        libraries.retain(|_, library| {
            let artifact = &library.library_artifact;
            let excluded = std::iter::once(&artifact.jar)
                .chain(&artifact.runtime_jar)
                .any(|jar| exclusions.matches(&jar.relative_path));
            !excluded && !self.augmenters.iter().any(|a| a.filter_library(library))
        });
        libraries
    }
}

fn phase_timing(sink: &DiagnosticSink, phase: &str, started: Instant) {
    let elapsed = started.elapsed();
    tracing::debug!(target: "bsync.java", phase, ?elapsed, "phase finished");
    sink.emit(Diagnostic::info(
        codes::PHASE_TIMING,
        format!("{phase} took {}ms", elapsed.as_millis()),
    ));
}

fn warn_deploy_jars(import_result: &ImportResult, sink: &DiagnosticSink) {
    for library in import_result.libraries.values() {
        let jar = &library.library_artifact.jar.relative_path;
        if DEPLOY_JAR_SUFFIXES.iter().any(|suffix| jar.ends_with(suffix)) {
            sink.emit(
                Diagnostic::warning(
                    codes::DEPLOY_JAR_LIBRARY,
                    format!("deploy jar {jar} is attached as a library"),
                )
                .with_note("the debugger may step into the deploy jar instead of your sources")
                .with_help("depend on the library targets instead, or exclude the jar"),
            );
        }
    }
}
