// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response shapes for the job API.

use br_core::job::{JobId, JobRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    /// Full campaign CSV, header line included.
    pub csv_content: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
    pub status: String,
    pub total_campaigns: usize,
}

/// Live snapshot of one job.
#[derive(Debug, Serialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: String,
    pub campaigns_created: usize,
    pub total_campaigns: usize,
    pub campaign_ids: Vec<String>,
    pub log_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&JobRecord> for JobSnapshot {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.id.clone(),
            status: record.status.to_string(),
            campaigns_created: record.completed_units,
            total_campaigns: record.total_units,
            campaign_ids: record.produced_ids.clone(),
            log_lines: record.log_tail(),
            error: record.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub job_id: JobId,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub hostname: String,
    pub active_jobs: usize,
    /// Input directory label to its sorted `*.csv` file names.
    pub available_ad_csvs: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
