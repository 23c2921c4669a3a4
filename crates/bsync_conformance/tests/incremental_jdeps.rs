//! Incremental dependency manifest loading across syncs.

use bsync_common::CancellationToken;
use bsync_conformance::*;
use bsync_jdeps::{PrefetchError, Prefetcher};
use std::path::PathBuf;

fn deps(run: &SyncRun, name: &str) -> Option<Vec<String>> {
    run.state()
        .jdeps
        .as_ref()?
        .label_to_jdeps()
        .get(&label(name))
        .cloned()
}

#[test]
fn untouched_manifest_is_not_parsed_again() {
    let fx = Fixture::new();
    let jdeps = fx.write_jdeps("x/y.jdeps", "//x:y", &["a/b.class"]);
    let graph = rules([with_jdeps(java_library("//x:y", &[], "x/liby.jar"), jdeps)]);

    let parser = RecordingParser::default();
    let engine = fx.engine().with_manifest_parser(Box::new(parser.clone()));

    let first = fx.sync_with(&engine, &graph, None, None);
    assert_eq!(parser.calls(), 1);
    assert_eq!(deps(&first, "//x:y"), Some(vec!["a/b.class".to_string()]));

    parser.reset();
    let second = fx.sync_with(&engine, &graph, None, Some(first.state()));
    assert_eq!(parser.calls(), 0);
    assert_eq!(deps(&second, "//x:y"), Some(vec!["a/b.class".to_string()]));
}

#[test]
fn only_changed_manifests_are_parsed() {
    let fx = Fixture::new();
    let a = fx.write_jdeps("a.jdeps", "//a:a", &["one.jar"]);
    let b = fx.write_jdeps("b.jdeps", "//b:b", &["two.jar"]);
    let graph = rules([
        with_jdeps(java_library("//a:a", &[], "a.jar"), a),
        with_jdeps(java_library("//b:b", &[], "b.jar"), b.clone()),
    ]);
    let parser = RecordingParser::default();
    let engine = fx.engine().with_manifest_parser(Box::new(parser.clone()));
    let first = fx.sync_with(&engine, &graph, None, None);

    parser.reset();
    fx.write_jdeps("b.jdeps", "//b:b", &["two.jar", "three.jar"]);
    let second = fx.sync_with(&engine, &graph, None, Some(first.state()));
    assert_eq!(parser.parsed(), vec![fx.decoder().decode(&b)]);
    assert_eq!(deps(&second, "//a:a"), Some(vec!["one.jar".to_string()]));
    assert_eq!(
        deps(&second, "//b:b"),
        Some(vec!["two.jar".to_string(), "three.jar".to_string()])
    );
}

#[test]
fn incremental_result_equals_fresh_result() {
    let fx = Fixture::new();
    let names = ["a", "b", "c"];
    let graph = rules(names.iter().map(|n| {
        let jar = format!("{n}.jar");
        let jdeps = fx.write_jdeps(&format!("{n}.jdeps"), &format!("//{n}:{n}"), &[jar.as_str()]);
        with_jdeps(java_library(&format!("//{n}:{n}"), &[], &format!("lib{n}.jar")), jdeps)
    }));

    let first = fx.sync(&graph, None);
    fx.write_jdeps("b.jdeps", "//b:b", &["b2.jar"]);
    let incremental = fx.sync(&graph, Some(first.state()));
    let fresh = fx.sync(&graph, None);

    let incremental_jdeps = incremental.state().jdeps.as_ref().unwrap();
    let fresh_jdeps = fresh.state().jdeps.as_ref().unwrap();
    assert_eq!(incremental_jdeps.label_to_jdeps(), fresh_jdeps.label_to_jdeps());
    assert_eq!(incremental_jdeps, fresh_jdeps);
}

#[test]
fn manifest_moved_to_another_target_matches_fresh_result() {
    let fx = Fixture::new();
    let shared = fx.write_jdeps("shared.jdeps", "//a:a", &["one.jar"]);
    let first = fx.sync(
        &rules([with_jdeps(java_library("//a:a", &[], "a.jar"), shared.clone())]),
        None,
    );

    let moved = rules([
        java_library("//a:a", &[], "a.jar"),
        with_jdeps(java_library("//b:b", &[], "b.jar"), shared),
    ]);
    let incremental = fx.sync(&moved, Some(first.state()));
    let fresh = fx.sync(&moved, None);
    assert!(deps(&incremental, "//a:a").is_none());
    assert_eq!(deps(&incremental, "//b:b"), Some(vec!["one.jar".to_string()]));
    assert_eq!(incremental.state().jdeps, fresh.state().jdeps);
}

#[test]
fn swapped_manifest_owners_match_fresh_result() {
    let fx = Fixture::new();
    let f1 = fx.write_jdeps("f1.jdeps", "//a:a", &["one.jar"]);
    let f2 = fx.write_jdeps("f2.jdeps", "//b:b", &["two.jar"]);
    let parser = RecordingParser::default();
    let engine = fx.engine().with_manifest_parser(Box::new(parser.clone()));
    let first = fx.sync_with(
        &engine,
        &rules([
            with_jdeps(java_library("//a:a", &[], "a.jar"), f1.clone()),
            with_jdeps(java_library("//b:b", &[], "b.jar"), f2.clone()),
        ]),
        None,
        None,
    );

    parser.reset();
    let swapped = rules([
        with_jdeps(java_library("//a:a", &[], "a.jar"), f2),
        with_jdeps(java_library("//b:b", &[], "b.jar"), f1),
    ]);
    let incremental = fx.sync_with(&engine, &swapped, None, Some(first.state()));
    assert_eq!(parser.calls(), 0);
    assert_eq!(deps(&incremental, "//a:a"), Some(vec!["two.jar".to_string()]));
    assert_eq!(deps(&incremental, "//b:b"), Some(vec!["one.jar".to_string()]));

    let fresh = fx.sync(&swapped, None);
    assert_eq!(incremental.state().jdeps, fresh.state().jdeps);
}

#[test]
fn deleted_manifest_removes_label() {
    let fx = Fixture::new();
    let a = fx.write_jdeps("a.jdeps", "//a:a", &["one.jar"]);
    let b = fx.write_jdeps("b.jdeps", "//b:b", &["two.jar"]);
    let graph = rules([
        with_jdeps(java_library("//a:a", &[], "a.jar"), a),
        with_jdeps(java_library("//b:b", &[], "b.jar"), b.clone()),
    ]);
    let first = fx.sync(&graph, None);
    assert!(deps(&first, "//b:b").is_some());

    fx.remove_generated(&b);
    let second = fx.sync(&graph, Some(first.state()));
    assert!(deps(&second, "//b:b").is_none());
    assert!(deps(&second, "//a:a").is_some());
}

#[test]
fn removed_target_removes_label() {
    let fx = Fixture::new();
    let a = fx.write_jdeps("a.jdeps", "//a:a", &["one.jar"]);
    let b = fx.write_jdeps("b.jdeps", "//b:b", &["two.jar"]);
    let first = fx.sync(
        &rules([
            with_jdeps(java_library("//a:a", &[], "a.jar"), a.clone()),
            with_jdeps(java_library("//b:b", &[], "b.jar"), b),
        ]),
        None,
    );
    let second = fx.sync(
        &rules([with_jdeps(java_library("//a:a", &[], "a.jar"), a)]),
        Some(first.state()),
    );
    assert!(deps(&second, "//b:b").is_none());
    assert_eq!(second.state().jdeps.as_ref().unwrap().len(), 1);
}

#[test]
fn corrupt_manifest_keeps_previous_entry() {
    let fx = Fixture::new();
    let a = fx.write_jdeps("a.jdeps", "//a:a", &["one.jar"]);
    let graph = rules([with_jdeps(java_library("//a:a", &[], "a.jar"), a.clone())]);
    let first = fx.sync(&graph, None);

    fx.write_generated(&a, &[0x0a, 0x7f, 0x01]);
    let second = fx.sync(&graph, Some(first.state()));
    assert_eq!(deps(&second, "//a:a"), Some(vec!["one.jar".to_string()]));
    assert_eq!(second.count("W102"), 1);
    assert!(second.result.is_ok());
}

struct Offline;

impl Prefetcher for Offline {
    fn prefetch(&self, files: &[PathBuf], _: &CancellationToken) -> Result<(), PrefetchError> {
        if files.is_empty() {
            return Ok(());
        }
        Err(PrefetchError::Failed {
            reason: "object store unreachable".to_string(),
        })
    }
}

#[test]
fn failed_prefetch_keeps_previous_state() {
    let fx = Fixture::new();
    let a = fx.write_jdeps("a.jdeps", "//a:a", &["one.jar"]);
    let graph = rules([with_jdeps(java_library("//a:a", &[], "a.jar"), a)]);
    let first = fx.sync(&graph, None);

    fx.write_jdeps("a.jdeps", "//a:a", &["changed.jar"]);
    let engine = fx.engine().with_prefetcher(Box::new(Offline));
    let second = fx.sync_with(&engine, &graph, None, Some(first.state()));
    assert!(!second.outcome().jdeps_reloaded);
    assert_eq!(second.count("E101"), 1);
    assert_eq!(second.state().jdeps, first.state().jdeps);
}
