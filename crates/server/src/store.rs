// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry behind a trait, so handlers and the supervisor share one
//! seam. All mutation goes through `update` closures under the store's own
//! lock; callers never hold job state across an await.

use br_core::job::{JobId, JobRecord};
use parking_lot::Mutex;
use std::collections::HashMap;

pub trait JobStore: Send + Sync {
    /// Insert a new job only when no other job is pending or running.
    /// Returns false when the single-flight gate is held.
    fn insert_if_idle(&self, record: JobRecord) -> bool;

    fn get(&self, id: &JobId) -> Option<JobRecord>;

    /// Apply a mutation to a job under the store lock. Returns false when
    /// the job is unknown.
    fn update(&self, id: &JobId, mutate: &mut dyn FnMut(&mut JobRecord)) -> bool;

    fn active_count(&self) -> usize;

    fn list(&self) -> Vec<JobRecord>;
}

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn insert_if_idle(&self, record: JobRecord) -> bool {
        let mut jobs = self.jobs.lock();
        if jobs.values().any(|j| j.status.is_active()) {
            return false;
        }
        jobs.insert(record.id.clone(), record);
        true
    }

    fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.lock().get(id).cloned()
    }

    fn update(&self, id: &JobId, mutate: &mut dyn FnMut(&mut JobRecord)) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.get_mut(id) {
            Some(record) => {
                mutate(record);
                true
            }
            None => false,
        }
    }

    fn active_count(&self) -> usize {
        self.jobs.lock().values().filter(|j| j.status.is_active()).count()
    }

    fn list(&self) -> Vec<JobRecord> {
        self.jobs.lock().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
