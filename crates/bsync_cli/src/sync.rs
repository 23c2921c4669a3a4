//! `bsync sync`: one incremental sync.
//!
//! 1. Load the configuration (`--config`, else `<workspace>/bsync.toml`, else defaults)
//! 2. Read the rule graph and the optional working set
//! 3. Load the previous state from the state directory
//! 4. Run the Java sync engine
//! 5. Persist the new state and report diagnostics

use std::path::Path;
use std::sync::Arc;

use bsync_cache::StateStore;
use bsync_common::CancellationToken;
use bsync_config::{SyncConfig, CONFIG_FILE_NAME};
use bsync_diagnostics::{DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer};
use bsync_ideinfo::{ArtifactLocationDecoder, BlazeRoots, RuleMap, WorkingSet, WorkspaceRoot};
use bsync_java::{JavaSyncEngine, SyncInput, SyncOutcome, SyncState};

use crate::{GlobalArgs, ReportFormat, SyncArgs, DEFAULT_STATE_DIR};

/// Runs the `bsync sync` command.
///
/// Returns exit code 0 on success, 1 if any error diagnostic was emitted.
/// A failed sync leaves the previously saved state untouched.
pub fn run(args: &SyncArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global.config.as_deref(), &args.workspace)?;
    let sink = DiagnosticSink::new();

    let rule_map = RuleMap::load(&args.rules, &sink)?;
    let working_set = match &args.working_set {
        Some(path) => Some(load_working_set(path)?),
        None => None,
    };
    let decoder = ArtifactLocationDecoder::new(
        WorkspaceRoot::new(&args.workspace),
        BlazeRoots::new(&args.execution_root, &args.output_base),
    );

    let state_dir = args
        .state_dir
        .clone()
        .unwrap_or_else(|| args.workspace.join(DEFAULT_STATE_DIR));
    let store = StateStore::new(&state_dir, env!("CARGO_PKG_VERSION"));
    let previous: Option<SyncState> = store.load();
    if previous.is_none() {
        tracing::info!(state = %store.state_path().display(), "no usable previous state, full sync");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.sync.parallelism)
        .thread_name(|i| format!("bsync-worker-{i}"))
        .build()?;
    let engine = JavaSyncEngine::new(config, Arc::new(pool))?;

    if !global.quiet {
        eprintln!("     Syncing {} targets", rule_map.len());
    }

    let input = SyncInput {
        rule_map: &rule_map,
        decoder: &decoder,
        working_set: working_set.as_ref(),
    };
    let outcome = engine.sync(input, previous.as_ref(), &sink, &CancellationToken::new())?;
    store.save(&outcome.state)?;

    report(&sink, args.format, global);
    if !global.quiet && args.format == ReportFormat::Text {
        print_summary(&outcome, &sink);
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

fn resolve_config(
    explicit: Option<&Path>,
    workspace: &Path,
) -> Result<SyncConfig, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?;
        return Ok(bsync_config::load_config_from_str(&content)?);
    }
    if workspace.join(CONFIG_FILE_NAME).is_file() {
        return Ok(bsync_config::load_config(workspace)?);
    }
    Ok(SyncConfig::default())
}

fn load_working_set(path: &Path) -> Result<WorkingSet, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read working set {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

fn report(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) {
    let diagnostics = sink.diagnostics();
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics
                .iter()
                .filter(|d| !global.quiet || d.severity.is_error())
            {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            for diag in &diagnostics {
                println!("{}", JsonRenderer.render(diag));
            }
        }
    }
}

fn print_summary(outcome: &SyncOutcome, sink: &DiagnosticSink) {
    let diff = &outcome.library_diff;
    let content_entries = outcome
        .state
        .java
        .as_ref()
        .map_or(0, |java| java.import_result.content_entries.len());
    eprintln!(
        "      Synced {} content root(s), libraries +{} -{} ={}, language level {}",
        content_entries,
        diff.to_add.len(),
        diff.to_remove.len(),
        diff.unchanged.len(),
        outcome.language_level
    );
    eprintln!(
        "      Result: {} error(s), {} warning(s)",
        sink.error_count(),
        sink.warning_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"[
        {
            "label": "//third_party/foo:foo",
            "kind": "java_import",
            "payload": {
                "kind": "java",
                "jars": [{ "jar": { "relative_path": "out/libfoo.jar", "is_source": true } }]
            }
        }
    ]"#;

    fn args(dir: &Path) -> SyncArgs {
        let rules = dir.join("rules.json");
        std::fs::write(&rules, RULES).unwrap();
        SyncArgs {
            workspace: dir.to_path_buf(),
            execution_root: dir.join("exec"),
            output_base: dir.join("base"),
            rules,
            working_set: None,
            state_dir: None,
            format: ReportFormat::Json,
        }
    }

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            color: false,
            config: None,
        }
    }

    #[test]
    fn sync_persists_state() {
        let dir = tempfile::tempdir().unwrap();
        let code = run(&args(dir.path()), &quiet()).unwrap();
        assert_eq!(code, 0);

        let store = StateStore::new(&dir.path().join(DEFAULT_STATE_DIR), env!("CARGO_PKG_VERSION"));
        let state: SyncState = store.load().unwrap();
        let java = state.java.unwrap();
        assert_eq!(java.attached_libraries.len(), 1);
    }

    #[test]
    fn second_sync_reuses_state() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());
        assert_eq!(run(&args, &quiet()).unwrap(), 0);
        assert_eq!(run(&args, &quiet()).unwrap(), 0);
    }

    #[test]
    fn missing_rules_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.rules = dir.path().join("missing.json");
        assert!(run(&args, &quiet()).is_err());
    }

    #[test]
    fn workspace_config_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[java]\nexclude_library = [\"out/*.jar\"]\n",
        )
        .unwrap();
        let config = resolve_config(None, dir.path()).unwrap();
        assert_eq!(config.java.exclude_library, vec!["out/*.jar".to_string()]);
    }

    #[test]
    fn missing_workspace_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_config(None, dir.path()).unwrap(), SyncConfig::default());
    }

    #[test]
    fn working_set_json_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.json");
        std::fs::write(&path, r#"{ "modified_files": ["java/com/app/Main.java"] }"#).unwrap();
        let ws = load_working_set(&path).unwrap();
        assert_eq!(ws.modified_files.len(), 1);
        assert!(ws.added_files.is_empty());
    }
}
