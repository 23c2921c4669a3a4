//! The Java workspace importer.
//!
//! One pass over the rule graph decides, per Java target, whether it is
//! editable content or a library. Content targets contribute source roots
//! and source files; library targets contribute their jars. Generated jars
//! are libraries either way, since the IDE cannot produce them.

use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::path::PathBuf;

use bsync_common::Label;
use bsync_config::ProjectSection;
use bsync_diagnostics::{Diagnostic, DiagnosticSink};
use bsync_ideinfo::{
    ArtifactLocation, ArtifactLocationDecoder, JavaRuleIdeInfo, LanguageLevel, LibraryArtifact,
    RuleIdeInfo, RuleMap, WorkspacePath,
};
use bsync_jdeps::JdepsMap;
use rayon::prelude::*;

use crate::codes;
use crate::model::{BlazeContentEntry, BlazeLibrary, BlazeSourceDirectory, ImportResult, LibraryKey};
use crate::package_manifest::{JavaSourcePackage, PackageReader, ProtoPackageReader};
use crate::error::PackageManifestError;
use crate::source_roots::{self, SourceFile, SourceRoot};
use crate::working_set::JavaWorkingSet;

/// Builds an [`ImportResult`] from the rule graph.
pub struct JavaWorkspaceImporter<'a> {
    rule_map: &'a RuleMap,
    jdeps: &'a dyn JdepsMap,
    working_set: Option<&'a JavaWorkingSet>,
    decoder: &'a ArtifactLocationDecoder,
    project: Option<&'a ProjectSection>,
    package_reader: &'a dyn PackageReader,
    pool: Option<&'a rayon::ThreadPool>,
    prune_unused_libraries: bool,
}

struct Candidate<'r> {
    label: &'r Label,
    artifact: &'r LibraryArtifact,
    prunable: bool,
}

impl<'a> JavaWorkspaceImporter<'a> {
    /// Creates an importer with no import directories, reading package
    /// manifests from disk on the calling thread.
    pub fn new(
        rule_map: &'a RuleMap,
        jdeps: &'a dyn JdepsMap,
        working_set: Option<&'a JavaWorkingSet>,
        decoder: &'a ArtifactLocationDecoder,
    ) -> Self {
        Self {
            rule_map,
            jdeps,
            working_set,
            decoder,
            project: None,
            package_reader: &ProtoPackageReader,
            pool: None,
            prune_unused_libraries: false,
        }
    }

    /// Imports every target with a source under the section's directories
    /// as content, and excludes its excluded directories.
    pub fn with_project(mut self, project: &'a ProjectSection) -> Self {
        self.project = Some(project);
        self
    }

    /// Reads package manifests through `reader`.
    pub fn with_package_reader(mut self, reader: &'a dyn PackageReader) -> Self {
        self.package_reader = reader;
        self
    }

    /// Reads package manifests on `pool`.
    pub fn with_pool(mut self, pool: &'a rayon::ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Drops library jars that no content target's manifest references.
    pub fn prune_unused_libraries(mut self, prune: bool) -> Self {
        self.prune_unused_libraries = prune;
        self
    }

    /// Runs the import.
    ///
    /// Targets that fail validation are skipped with a warning; nothing else
    /// about a single target can fail the import.
    pub fn import(&self, sink: &DiagnosticSink) -> ImportResult {
        let mut content: Vec<(&RuleIdeInfo, &JavaRuleIdeInfo)> = Vec::new();
        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        let mut build_output_jars = BTreeSet::new();
        let mut toolchain_version: Option<LanguageLevel> = None;

        for rule in self.rule_map {
            if let Some(toolchain) = rule.java_toolchain() {
                toolchain_version = toolchain_version.max(Some(toolchain.source_version));
                continue;
            }
            let Some(java) = rule.java() else {
                continue;
            };
            if let Err(e) = rule.validate() {
                sink.emit(
                    Diagnostic::warning(codes::RULE_SKIPPED, format!("skipping target: {e}"))
                        .for_target(&rule.label),
                );
                continue;
            }

            for artifact in java.jars.iter().chain(&java.generated_jars) {
                build_output_jars.insert(self.decoder.decode(&artifact.jar));
                if let Some(runtime) = &artifact.runtime_jar {
                    build_output_jars.insert(self.decoder.decode(runtime));
                }
            }

            let is_content = self.is_content(rule);
            if is_content {
                content.push((rule, java));
            } else {
                candidates.extend(java.jars.iter().map(|artifact| Candidate {
                    label: &rule.label,
                    artifact,
                    prunable: true,
                }));
            }
            candidates.extend(java.generated_jars.iter().map(|artifact| Candidate {
                label: &rule.label,
                artifact,
                prunable: !is_content,
            }));
        }

        let packages = self.read_package_manifests(&content, sink);
        let mut files = Vec::new();
        let mut java_source_files = BTreeSet::new();
        for (rule, _) in &content {
            for source in &rule.sources {
                let Some(path) = workspace_path(source) else {
                    continue;
                };
                if !path.file_name().ends_with(".java") {
                    continue;
                }
                java_source_files.insert(self.decoder.decode(source));
                files.push(SourceFile {
                    package: packages.get(&source.relative_path).cloned(),
                    path,
                    is_test: rule.kind.is_test(),
                });
            }
        }

        let source_version = content
            .iter()
            .filter_map(|(_, java)| java.source_version)
            .max()
            .or(toolchain_version);

        let candidates = self.prune(candidates, &content);
        let libraries = dedup_libraries(candidates, sink);

        tracing::debug!(
            target: "bsync.java",
            content_targets = content.len(),
            libraries = libraries.len(),
            source_files = java_source_files.len(),
            "import finished"
        );

        ImportResult {
            content_entries: self.content_entries(&files),
            libraries,
            build_output_jars,
            java_source_files,
            source_version,
        }
    }

    fn is_content(&self, rule: &RuleIdeInfo) -> bool {
        rule.sources.iter().filter_map(workspace_path).any(|path| {
            self.working_set.is_some_and(|ws| ws.contains(&path))
                || self.project.is_some_and(|p| p.includes(&path))
        })
    }

    fn read_package_manifests(
        &self,
        content: &[(&RuleIdeInfo, &JavaRuleIdeInfo)],
        sink: &DiagnosticSink,
    ) -> BTreeMap<String, String> {
        let jobs: Vec<(Label, PathBuf)> = content
            .iter()
            .filter_map(|(rule, java)| {
                let manifest = java.package_manifest.as_ref()?;
                Some((rule.label.clone(), self.decoder.decode(manifest)))
            })
            .collect();

        let reader = self.package_reader;
        let read = |(label, path): &(Label, PathBuf)| (label.clone(), reader.read(path));
        let results: Vec<(Label, Result<Vec<JavaSourcePackage>, PackageManifestError>)> =
            match self.pool {
                Some(pool) => pool.install(|| jobs.par_iter().map(read).collect()),
                None => jobs.iter().map(read).collect(),
            };

        let mut packages = BTreeMap::new();
        for (label, result) in results {
            match result {
                Ok(sources) => {
                    for source in sources {
                        packages
                            .entry(source.location.relative_path)
                            .or_insert(source.package);
                    }
                }
                Err(e) => sink.emit(
                    Diagnostic::warning(codes::PACKAGE_MANIFEST_UNREADABLE, e.to_string())
                        .for_target(&label)
                        .with_note("source roots for this target are derived from directories"),
                ),
            }
        }
        packages
    }

    fn prune<'r>(
        &self,
        candidates: Vec<Candidate<'r>>,
        content: &[(&RuleIdeInfo, &JavaRuleIdeInfo)],
    ) -> Vec<Candidate<'r>> {
        if !self.prune_unused_libraries {
            return candidates;
        }
        let mut used: BTreeSet<&str> = BTreeSet::new();
        // Content targets without jdeps keep every direct dependency.
        let mut direct: BTreeSet<&Label> = BTreeSet::new();
        let mut any_jdeps = false;
        for (rule, _) in content {
            match self.jdeps.dependencies(&rule.label) {
                Some(deps) => {
                    any_jdeps = true;
                    used.extend(deps.iter().map(String::as_str));
                }
                None => direct.extend(&rule.dependencies),
            }
        }
        if !any_jdeps {
            return candidates;
        }

        let before = candidates.len();
        let kept: Vec<_> = candidates
            .into_iter()
            .filter(|c| {
                !c.prunable
                    || direct.contains(c.label)
                    || c.artifact
                        .locations()
                        .filter(|loc| Some(*loc) != c.artifact.source_jar.as_ref())
                        .any(|loc| used.contains(loc.execution_root_relative_path().as_str()))
            })
            .collect();
        tracing::debug!(
            target: "bsync.java",
            pruned = before - kept.len(),
            "dropped libraries unused by content targets"
        );
        kept
    }

    fn content_entries(&self, files: &[SourceFile]) -> Vec<BlazeContentEntry> {
        let directories = self
            .project
            .map(|p| p.directories.as_slice())
            .unwrap_or_default();
        let excludes = self
            .project
            .map(|p| p.exclude_directories.as_slice())
            .unwrap_or_default();

        let mut partitions: BTreeMap<Option<WorkspacePath>, Vec<SourceFile>> = BTreeMap::new();
        for file in files {
            let group = directories
                .iter()
                .filter(|d| d.is_ancestor_of(&file.path))
                .min_by_key(|d| d.as_str().len())
                .cloned();
            partitions.entry(group).or_default().push(file.clone());
        }

        let mut entries: BTreeMap<WorkspacePath, BTreeMap<WorkspacePath, SourceRoot>> =
            BTreeMap::new();
        for (group, files) in partitions {
            let roots = source_roots::calculate(&files);
            match group {
                Some(content_root) => {
                    let sources = entries.entry(content_root.clone()).or_default();
                    for (dir, root) in roots {
                        let (dir, root) = clip_to(&content_root, dir, root);
                        sources.entry(dir).or_insert(root);
                    }
                }
                None => {
                    for (dir, root) in roots {
                        let parent = entries
                            .keys()
                            .find(|r| r.is_ancestor_of(&dir))
                            .cloned();
                        entries
                            .entry(parent.unwrap_or_else(|| dir.clone()))
                            .or_default()
                            .insert(dir, root);
                    }
                }
            }
        }

        let workspace = self.decoder.workspace_root();
        entries
            .into_iter()
            .map(|(content_root, sources)| BlazeContentEntry {
                content_root: workspace.file_for_path(&content_root),
                sources: sources
                    .into_iter()
                    .map(|(dir, root)| BlazeSourceDirectory {
                        directory: workspace.file_for_path(&dir),
                        package_prefix: root.package_prefix,
                        is_test: root.is_test,
                    })
                    .collect(),
                excludes: excludes
                    .iter()
                    .filter(|e| content_root.is_ancestor_of(e))
                    .map(|e| workspace.file_for_path(e))
                    .collect(),
            })
            .collect()
    }
}

/// Moves a source root that lies above `content_root` down to it.
fn clip_to(
    content_root: &WorkspacePath,
    dir: WorkspacePath,
    root: SourceRoot,
) -> (WorkspacePath, SourceRoot) {
    if dir != *content_root && dir.is_ancestor_of(content_root) {
        let package_prefix = source_roots::implied_package(&dir, &root.package_prefix, content_root);
        (
            content_root.clone(),
            SourceRoot {
                package_prefix,
                is_test: root.is_test,
            },
        )
    } else {
        (dir, root)
    }
}

fn workspace_path(location: &ArtifactLocation) -> Option<WorkspacePath> {
    if !location.is_source || location.is_external() {
        return None;
    }
    WorkspacePath::new(&location.relative_path).ok()
}

fn dedup_libraries(
    candidates: Vec<Candidate<'_>>,
    sink: &DiagnosticSink,
) -> BTreeMap<LibraryKey, BlazeLibrary> {
    let mut libraries: BTreeMap<LibraryKey, (BlazeLibrary, &Label)> = BTreeMap::new();
    for candidate in candidates {
        let library = BlazeLibrary::new(candidate.artifact.clone());
        match libraries.entry(library.key.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert((library, candidate.label));
            }
            btree_map::Entry::Occupied(existing) => {
                let (kept, first) = existing.get();
                if kept.library_artifact != library.library_artifact {
                    sink.emit(
                        Diagnostic::info(
                            codes::LIBRARY_CONFLICT,
                            format!("library {} is produced with different jars", library.key),
                        )
                        .for_target(candidate.label)
                        .with_note(format!("keeping the library from {first}")),
                    );
                }
            }
        }
    }
    libraries
        .into_iter()
        .map(|(key, (library, _))| (key, library))
        .collect()
}
