// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session bootstrap handoff through the session file.
//!
//! The primary worker authenticates once and publishes the resulting
//! artifact to a well-known file; every other worker polls that file until
//! it appears. The file is written via temp + rename, so pollers never
//! observe a half-written artifact.

use crate::agent::SessionArtifact;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("no session artifact after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("halted while awaiting session artifact")]
    Halted,
    #[error("session file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Atomically publish the session artifact for non-primary workers.
pub fn publish(path: &Path, artifact: &SessionArtifact) -> Result<(), BootstrapError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&tmp_path, json.as_bytes())?;
    fs::rename(&tmp_path, path)?;
    tracing::info!(path = %path.display(), "published session artifact");
    Ok(())
}

/// Remove a stale artifact from a previous run, if any.
pub fn clear(path: &Path) -> Result<(), BootstrapError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Poll for the artifact at `interval` up to `max_attempts` times.
///
/// Returns `Halted` as soon as the halt token fires, so a failed primary
/// never leaves pollers waiting out the full attempt budget.
pub async fn await_artifact(
    path: &Path,
    interval: Duration,
    max_attempts: u32,
    halt: &CancellationToken,
) -> Result<SessionArtifact, BootstrapError> {
    for attempt in 1..=max_attempts {
        match fs::read_to_string(path) {
            Ok(content) => return Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(attempt, max_attempts, "session artifact not yet published");
            }
            Err(e) => return Err(e.into()),
        }
        tokio::select! {
            _ = halt.cancelled() => return Err(BootstrapError::Halted),
            _ = tokio::time::sleep(interval) => {}
        }
    }
    Err(BootstrapError::Timeout { attempts: max_attempts })
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
