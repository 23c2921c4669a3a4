//! Import classification, deduplication and determinism.

use bsync_conformance::*;
use bsync_ideinfo::{ArtifactLocation, JavaRuleIdeInfo, LibraryArtifact, RulePayload, WorkingSet};
use bsync_java::LibraryKey;

fn working_set(files: &[&str]) -> WorkingSet {
    WorkingSet {
        modified_files: files.iter().map(|f| wp(f)).collect(),
        ..Default::default()
    }
}

#[test]
fn empty_graph_imports_nothing() {
    let fx = Fixture::new();
    let run = fx.sync(&RuleMap::default(), None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    assert!(import.content_entries.is_empty());
    assert!(import.libraries.is_empty());
    assert!(import.java_source_files.is_empty());
    assert_eq!(run.count("E101"), 0);
}

fn libfoo() -> bsync_ideinfo::RuleIdeInfo {
    let mut rule = java_import("//third_party/foo:foo", "out/libfoo.jar")
        .with_source(ArtifactLocation::source("third_party/foo/Foo.java"));
    rule.kind = bsync_ideinfo::RuleKind::new("java_library");
    rule
}

#[test]
fn untouched_target_is_a_library() {
    let fx = Fixture::new();
    let run = fx.sync(&rules([libfoo()]), None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    let keys: Vec<_> = import.libraries.keys().map(LibraryKey::as_str).collect();
    assert_eq!(keys, vec!["out/libfoo.jar"]);
    assert!(import.content_entries.is_empty());
}

#[test]
fn working_set_source_makes_target_content() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let ws = working_set(&["third_party/foo/Foo.java"]);
    let run = fx.sync_with(&engine, &rules([libfoo()]), Some(&ws), None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    assert!(import.libraries.is_empty());
    assert_eq!(import.content_entries.len(), 1);
    let entry = &import.content_entries[0];
    assert_eq!(entry.content_root, fx.workspace().join("third_party/foo"));
    assert_eq!(entry.sources.len(), 1);
    assert_eq!(entry.sources[0].directory, fx.workspace().join("third_party/foo"));
    assert!(import
        .java_source_files
        .contains(&fx.workspace().join("third_party/foo/Foo.java")));
}

#[test]
fn working_set_is_ignored_when_disabled() {
    let mut fx = Fixture::new();
    fx.config.sync.use_working_set = false;
    let engine = fx.engine();
    let ws = working_set(&["third_party/foo/Foo.java"]);
    let run = fx.sync_with(&engine, &rules([libfoo()]), Some(&ws), None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    assert_eq!(import.libraries.len(), 1);
    assert!(import.content_entries.is_empty());
}

#[test]
fn project_directories_select_content() {
    let mut fx = Fixture::new();
    fx.config.project.directories = vec![wp("java/com/app")];
    let graph = rules([
        java_library("//java/com/app:app", &["java/com/app/Main.java"], "java/com/app/libapp.jar"),
        java_library("//java/com/lib:lib", &["java/com/lib/Lib.java"], "java/com/lib/liblib.jar"),
    ]);
    let run = fx.sync(&graph, None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    assert_eq!(import.content_entries.len(), 1);
    let keys: Vec<_> = import.libraries.keys().map(LibraryKey::as_str).collect();
    assert_eq!(keys, vec!["bazel-out/bin/java/com/lib/liblib.jar"]);
}

#[test]
fn identity_maps_to_a_single_payload() {
    let fx = Fixture::new();
    let mut with_sources = java_import("//b:b", "shared/lib.jar");
    if let Some(RulePayload::Java(java)) = &mut with_sources.payload {
        java.jars = vec![LibraryArtifact::new(ArtifactLocation::source("shared/lib.jar"))
            .with_source_jar(ArtifactLocation::source("shared/lib-src.jar"))];
    }
    let graph = rules([
        java_import("//a:a", "shared/lib.jar"),
        with_sources,
        java_import("//c:c", "shared/lib.jar"),
    ]);
    let run = fx.sync(&graph, None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    assert_eq!(import.libraries.len(), 1);
    for (key, library) in &import.libraries {
        assert_eq!(*key, library.key);
        assert_eq!(*key, LibraryKey::from_jar(&library.library_artifact.jar));
    }
    assert_eq!(run.count("I201"), 1);
}

#[test]
fn import_is_idempotent() {
    let fx = Fixture::new();
    let jdeps = fx.write_jdeps("app.jdeps", "//app:app", &["bazel-out/bin/lib.jar"]);
    let graph = rules([
        with_jdeps(java_library("//app:app", &["app/App.java"], "app.jar"), jdeps),
        java_library("//lib:lib", &["lib/Lib.java"], "lib.jar"),
        java_import("//third_party:guava", "third_party/guava.jar"),
    ]);
    let engine = fx.engine();
    let ws = working_set(&["app/App.java"]);
    let first = fx.sync_with(&engine, &graph, Some(&ws), None);
    let second = fx.sync_with(&engine, &graph, Some(&ws), None);
    assert_eq!(
        state_bytes(first.state()),
        state_bytes(second.state()),
        "same inputs must give byte-identical state"
    );
}

#[test]
fn malformed_target_is_skipped_and_the_rest_imported() {
    let fx = Fixture::new();
    let mut broken = java_import("//broken:broken", "ok.jar");
    if let Some(RulePayload::Java(java)) = &mut broken.payload {
        java.jars.push(LibraryArtifact::new(ArtifactLocation::source("../escape.jar")));
    }
    let graph = rules([broken, java_import("//good:good", "good.jar")]);
    let run = fx.sync(&graph, None);
    let import = &run.state().java.as_ref().unwrap().import_result;
    let keys: Vec<_> = import.libraries.keys().map(LibraryKey::as_str).collect();
    assert_eq!(keys, vec!["good.jar"]);
    assert_eq!(run.count("W203"), 1);
}

#[test]
fn toolchain_version_is_used_without_target_versions() {
    let fx = Fixture::new();
    let toolchain = bsync_ideinfo::RuleIdeInfo::new(label("//tools:jdk"), "java_toolchain")
        .with_payload(RulePayload::JavaToolchain(bsync_ideinfo::JavaToolchainIdeInfo {
            source_version: bsync_ideinfo::LanguageLevel::new(11),
            target_version: None,
        }));
    let plain = java_import("//a:a", "a.jar");
    let run = fx.sync(&rules([toolchain, plain]), None);
    assert_eq!(run.outcome().language_level, bsync_ideinfo::LanguageLevel::new(11));

    let mut pinned = java_import("//b:b", "b.jar");
    if let Some(RulePayload::Java(JavaRuleIdeInfo { source_version, .. })) = &mut pinned.payload {
        *source_version = Some(bsync_ideinfo::LanguageLevel::new(8));
    }
    let run = fx.sync(&rules([pinned]), None);
    assert_eq!(run.outcome().language_level, bsync_ideinfo::LanguageLevel::BASELINE);
}

#[test]
fn rule_graph_loaded_from_json_imports_like_built_graph() {
    let document = serde_json::json!([
        {
            "label": "//third_party:guava",
            "kind": "java_import",
            "payload": {
                "kind": "java",
                "jars": [{"jar": {"relative_path": "third_party/guava.jar", "is_source": true}}]
            }
        },
        {"label": "not a label", "kind": "java_library"},
        {
            "label": "//third_party:guava",
            "kind": "java_import",
            "payload": {
                "kind": "java",
                "jars": [{"jar": {"relative_path": "third_party/other.jar", "is_source": true}}]
            }
        }
    ]);
    let sink = bsync_diagnostics::DiagnosticSink::new();
    let graph = RuleMap::from_json(&document.to_string(), &sink).unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(sink.warning_count(), 2);

    let fx = Fixture::new();
    let from_json = fx.sync(&graph, None);
    let built = fx.sync(
        &rules([java_import("//third_party:guava", "third_party/guava.jar")]),
        None,
    );
    let libraries = |run: &SyncRun| {
        run.state()
            .java
            .as_ref()
            .unwrap()
            .import_result
            .libraries
            .keys()
            .map(|k| k.as_str().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(libraries(&from_json), vec!["third_party/guava.jar"]);
    assert_eq!(libraries(&from_json), libraries(&built));
}
