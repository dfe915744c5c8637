// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI binary.
//!
//! Mirrors the server's resolution so that `brd`-spawned pipelines and
//! hand-run invocations land in the same state directory.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("cannot resolve a state directory (no BR_STATE_DIR, XDG_STATE_HOME, or HOME)")]
    NoStateDir,
}

/// Resolve state directory: BR_STATE_DIR > XDG_STATE_HOME/batchrun > ~/.local/state/batchrun
pub fn state_dir() -> Result<PathBuf, EnvError> {
    if let Ok(dir) = std::env::var("BR_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("batchrun"));
    }
    let home = std::env::var("HOME").map_err(|_| EnvError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/batchrun"))
}
