//! `bsync clean`: delete persisted sync state.

use std::path::PathBuf;

use bsync_cache::StateStore;

use crate::{CleanArgs, GlobalArgs, DEFAULT_STATE_DIR};

/// Runs the `bsync clean` command. Removing state that does not exist is
/// not an error.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = args
        .state_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
    let store = StateStore::new(&dir, env!("CARGO_PKG_VERSION"));
    let removed = store.clear()?;
    if !global.quiet {
        if removed {
            eprintln!("     Removed {}", store.state_path().display());
        } else {
            eprintln!("     Nothing to clean in {}", dir.display());
        }
    }
    Ok(0)
}
