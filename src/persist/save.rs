use super::serialize;
use crate::sim::state::GameState;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, warn};

/// Writes to a sibling temp file, then renames over the slot.
pub fn save_game(state: &GameState, path: &Path) -> Result<()> {
    let serialized = serialize(state)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, serialized).with_context(|| format!("writing {}", temp.display()))?;
    fs::rename(&temp, path).with_context(|| format!("replacing {}", path.display()))?;
    debug!(path = %path.display(), "saved");
    Ok(())
}

/// Checkpoint save on the blocking pool. Failures are logged and dropped.
pub fn save_in_background(state: GameState, path: PathBuf) {
    task::spawn_blocking(move || {
        if let Err(err) = save_game(&state, &path) {
            warn!(path = %path.display(), error = %err, "checkpoint save failed");
        }
    });
}
