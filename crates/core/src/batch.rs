// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch, WorkItem and Subtask: the unit-of-work model.
//!
//! A Batch is an ordered sequence of WorkItems loaded from a validated
//! external source. Each WorkItem carries an ordered set of Subtasks; a
//! Subtask may name another Subtask in the same item as its prerequisite,
//! in which case it runs only after that prerequisite produced an
//! identifier successfully.

use crate::result::TaskStatus;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for one batch run, used to key checkpoint snapshots.
    ///
    /// Generated when the batch is loaded; a resumed run reuses the
    /// session id of the run it continues.
    pub struct SessionId("ses-");
}

/// Recorded execution state of a Subtask, persisted via checkpoints.
///
/// `result == None` means the subtask has not been attempted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_id: Option<String>,
}

impl SubtaskState {
    /// True when a previous run already completed this subtask.
    pub fn is_done(&self) -> bool {
        self.result == Some(TaskStatus::Success)
    }
}

/// A single step within a WorkItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique tag within the item (e.g. "desktop", "ios", "android").
    pub tag: String,
    /// Opaque workflow name handed to the automation agent.
    pub workflow: String,
    /// Opaque parameters for the workflow step.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Tag of the prerequisite subtask whose produced identifier this
    /// step consumes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    /// Recorded status, restored from a checkpoint on resume.
    #[serde(default)]
    pub state: SubtaskState,
}

impl Subtask {
    pub fn new(tag: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            workflow: workflow.into(),
            params: serde_json::Value::Null,
            requires: None,
            state: SubtaskState::default(),
        }
    }

    crate::setters! {
        set {
            params: serde_json::Value,
        }
        option {
            requires: String,
        }
    }
}

/// One unit of work: a group of subtasks sharing settings and an input
/// artifact reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Group identifier, unique within the batch.
    pub group: String,
    /// Disabled items are excluded from partitioning and counted separately.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ordered subtasks; execution order is declaration order.
    pub subtasks: Vec<Subtask>,
    /// Opaque per-item settings payload.
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Reference to an external input artifact (e.g. an ad CSV file name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl WorkItem {
    pub fn new(group: impl Into<String>, subtasks: Vec<Subtask>) -> Self {
        Self {
            group: group.into(),
            enabled: true,
            subtasks,
            settings: serde_json::Value::Null,
            source_ref: None,
        }
    }

    pub fn subtask(&self, tag: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.tag == tag)
    }

    pub fn subtask_mut(&mut self, tag: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.tag == tag)
    }
}

/// An ordered sequence of WorkItems with a generated session id.
///
/// Immutable once loaded except for per-subtask status annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub session_id: SessionId,
    /// Path or name of the validated input this batch was loaded from.
    pub input_file: String,
    pub items: Vec<WorkItem>,
}

impl Batch {
    pub fn new(input_file: impl Into<String>, items: Vec<WorkItem>) -> Self {
        Self { session_id: SessionId::new(), input_file: input_file.into(), items }
    }

    pub fn enabled_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|i| i.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled_items().count()
    }

    pub fn disabled_count(&self) -> usize {
        self.items.len() - self.enabled_count()
    }

    pub fn item(&self, group: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.group == group)
    }

    pub fn item_mut(&mut self, group: &str) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|i| i.group == group)
    }
}

crate::builder! {
    pub struct WorkItemBuilder => WorkItem {
        into {
            group: String = "group-1",
        }
        set {
            enabled: bool = true,
            subtasks: Vec<Subtask> = vec![Subtask::new("desktop", "create_campaign")],
            settings: serde_json::Value = serde_json::Value::Null,
        }
        option {
            source_ref: String = None,
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
