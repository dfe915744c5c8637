// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contiguous ceiling-division batch partitioning.

use br_core::batch::Batch;
use br_core::batch::WorkItem;
use br_core::worker::WorkerId;

/// Upper bound on concurrent workers.
pub const MAX_WORKERS: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("batch contains no work items")]
    EmptyBatch,
    #[error("worker count must be 1..={MAX_WORKERS}, got {0}")]
    InvalidWorkerCount(usize),
}

/// One worker's slice of the batch. WorkItems are never split.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    pub worker: WorkerId,
    pub items: Vec<WorkItem>,
}

impl Shard {
    pub fn subtask_count(&self) -> usize {
        self.items.iter().map(|i| i.subtasks.len()).sum()
    }
}

/// Split the enabled items of a batch into at most `workers` contiguous
/// shards (ceiling division: every shard takes the ceiling share except the
/// last, which takes what is left).
///
/// A batch with items that are all disabled partitions to no shards at all:
/// nothing to do is not an error. A batch with no items is.
pub fn partition(batch: &Batch, workers: usize) -> Result<Vec<Shard>, PartitionError> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(PartitionError::InvalidWorkerCount(workers));
    }
    if batch.items.is_empty() {
        return Err(PartitionError::EmptyBatch);
    }

    let enabled: Vec<WorkItem> = batch.enabled_items().cloned().collect();
    if enabled.is_empty() {
        tracing::info!(disabled = batch.disabled_count(), "no enabled items to partition");
        return Ok(Vec::new());
    }

    let chunk = enabled.len().div_ceil(workers);
    let shards: Vec<Shard> = enabled
        .chunks(chunk)
        .enumerate()
        .map(|(i, items)| Shard {
            worker: WorkerId::new(i + 1),
            items: items.to_vec(),
        })
        .collect();

    tracing::debug!(
        items = enabled.len(),
        workers,
        shards = shards.len(),
        "partitioned batch"
    );
    Ok(shards)
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;
