// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint snapshots for resumable batch runs.
//!
//! One JSON file per session under `<state_dir>/checkpoints/`, rewritten
//! atomically after every WorkItem completes. A resumed run loads the
//! snapshot by session id and replays the recorded subtask states onto a
//! freshly loaded batch, so only unfinished work is attempted again.

use br_core::batch::{Batch, SessionId, WorkItem};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// On-disk snapshot of one session's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub session_id: SessionId,
    pub input_file: String,
    /// RFC 3339, set on the first save and carried forward.
    pub started_at: String,
    /// RFC 3339, refreshed on every save.
    pub last_updated: String,
    pub items: Vec<WorkItem>,
}

impl CheckpointRecord {
    /// Count of subtasks a previous run already completed.
    pub fn completed_subtasks(&self) -> usize {
        self.items
            .iter()
            .flat_map(|i| &i.subtasks)
            .filter(|s| s.state.is_done())
            .count()
    }

    pub fn total_subtasks(&self) -> usize {
        self.items.iter().map(|i| i.subtasks.len()).sum()
    }
}

/// Listing entry for `checkpoints list`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointSummary {
    pub session_id: SessionId,
    pub input_file: String,
    pub started_at: String,
    pub last_updated: String,
    pub completed_subtasks: usize,
    pub total_subtasks: usize,
}

/// File-per-session checkpoint store.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join("checkpoints"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Persist the batch's current subtask states.
    ///
    /// Writes to a temp file and renames over the previous snapshot, so a
    /// crash mid-write never leaves a truncated checkpoint. `started_at`
    /// is taken from the existing snapshot when one is present.
    pub fn save(&self, batch: &Batch) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir)?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let started_at = match self.load(&batch.session_id)? {
            Some(existing) => existing.started_at,
            None => now.clone(),
        };

        let record = CheckpointRecord {
            session_id: batch.session_id.clone(),
            input_file: batch.input_file.clone(),
            started_at,
            last_updated: now,
            items: batch.items.clone(),
        };

        let path = self.path(&batch.session_id);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&tmp_path, json.as_bytes())?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the snapshot for a session, or None when no checkpoint exists.
    pub fn load(&self, session_id: &SessionId) -> Result<Option<CheckpointRecord>, CheckpointError> {
        let path = self.path(session_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Replay recorded successes from a snapshot onto a freshly loaded batch.
    ///
    /// Only successful subtask states carry over; failed or skipped work is
    /// left unattempted so the resumed run retries it. Matching is by
    /// (group, tag), so items that no longer exist in the input are ignored.
    /// Returns the number of subtasks restored. Idempotent.
    pub fn restore(&self, batch: &mut Batch, record: &CheckpointRecord) -> usize {
        batch.session_id = record.session_id.clone();

        let mut restored = 0;
        for saved_item in &record.items {
            let Some(item) = batch.item_mut(&saved_item.group) else {
                tracing::warn!(
                    group = %saved_item.group,
                    "checkpointed item missing from input, ignoring"
                );
                continue;
            };
            for saved in &saved_item.subtasks {
                if !saved.state.is_done() {
                    continue;
                }
                if let Some(subtask) = item.subtask_mut(&saved.tag) {
                    subtask.state = saved.state.clone();
                    restored += 1;
                }
            }
        }
        restored
    }

    /// List all snapshots, newest last-updated first. Corrupt files are
    /// skipped with a warning.
    pub fn list(&self) -> Result<Vec<CheckpointSummary>, CheckpointError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read checkpoint");
                    continue;
                }
            };
            match serde_json::from_str::<CheckpointRecord>(&content) {
                Ok(record) => summaries.push(CheckpointSummary {
                    completed_subtasks: record.completed_subtasks(),
                    total_subtasks: record.total_subtasks(),
                    session_id: record.session_id,
                    input_file: record.input_file,
                    started_at: record.started_at,
                    last_updated: record.last_updated,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping corrupt checkpoint");
                }
            }
        }

        summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(summaries)
    }

    /// Delete a session's snapshot. Returns false when none existed.
    pub fn delete(&self, session_id: &SessionId) -> Result<bool, CheckpointError> {
        match fs::remove_file(self.path(session_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
