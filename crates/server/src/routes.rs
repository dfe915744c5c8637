// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: submit, poll, cancel, health.

use crate::env;
use crate::protocol::{
    CancelResponse, CreateJobRequest, CreateJobResponse, ErrorBody, HealthResponse, JobSnapshot,
};
use crate::runner;
use crate::store::JobStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use br_core::clock::{Clock, SystemClock};
use br_core::job::{JobId, JobRecord, JobStatus};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub state_dir: PathBuf,
    /// Where submitted CSV payloads are persisted for the pipeline child.
    pub input_dir: PathBuf,
    pub pipeline_bin: PathBuf,
}

impl ServerConfig {
    pub fn new(state_dir: impl Into<PathBuf>, pipeline_bin: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let input_dir = state_dir.join("input");
        Self {
            state_dir,
            input_dir,
            pipeline_bin: pipeline_bin.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    /// Live cancellation handles, one per supervised child.
    pub processes: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, config: ServerConfig) -> Self {
        Self {
            store,
            processes: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
        }
    }
}

pub enum ApiError {
    Busy,
    NotFound,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Busy => (
                StatusCode::TOO_MANY_REQUESTS,
                "a job is already running; try again later".to_string(),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "job not found".to_string()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{id}", get(get_job).delete(cancel_job))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The original server caps parallelism at 4 regardless of the request.
pub(crate) fn clamp_workers(requested: usize) -> usize {
    requested.clamp(1, 4)
}

/// Expected unit count from the payload alone: non-empty lines minus the
/// header. The pipeline's own announcement later overrides this.
pub(crate) fn expected_units(csv: &str) -> usize {
    csv.lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        .saturating_sub(1)
}

async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let workers = clamp_workers(request.workers);
    let total = expected_units(&request.csv_content);
    let id = JobId::new();

    let record = JobRecord::new(id.clone(), request.dry_run, workers, total, SystemClock.epoch_ms());
    if !state.store.insert_if_idle(record) {
        return Err(ApiError::Busy);
    }

    let input_path = state
        .config
        .input_dir
        .join(format!("batch_{}.csv", id.suffix()));
    let written = std::fs::create_dir_all(&state.config.input_dir)
        .and_then(|()| std::fs::write(&input_path, &request.csv_content));
    if let Err(e) = written {
        state.store.update(&id, &mut |job| {
            job.status = JobStatus::Failed;
            job.error = Some(format!("could not persist input: {e}"));
        });
        return Err(ApiError::Internal(format!("could not persist input: {e}")));
    }

    let token = CancellationToken::new();
    state.processes.lock().insert(id.clone(), token.clone());
    tracing::info!(job = %id, workers, dry_run = request.dry_run, total, "job accepted");
    let supervisor_state = state.clone();
    let job_id = id.clone();
    let dry_run = request.dry_run;
    tokio::spawn(async move {
        runner::supervise(
            supervisor_state.store.clone(),
            supervisor_state.config.clone(),
            job_id.clone(),
            input_path,
            workers,
            dry_run,
            token,
        )
        .await;
        // The handle is dead weight once the job is terminal.
        supervisor_state.processes.lock().remove(&job_id);
    });

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id: id,
            status: JobStatus::Pending.to_string(),
            total_campaigns: total,
        }),
    ))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let record = state
        .store
        .get(&JobId::from_string(id))
        .ok_or(ApiError::NotFound)?;
    Ok(Json(JobSnapshot::from(&record)))
}

async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id = JobId::from_string(id);
    let record = state.store.get(&id).ok_or(ApiError::NotFound)?;

    if !record.status.is_active() {
        return Ok(Json(CancelResponse {
            job_id: id,
            message: "Job is not running".to_string(),
        }));
    }

    match state.processes.lock().get(&id) {
        Some(token) => {
            token.cancel();
            tracing::info!(job = %id, "cancellation requested");
            Ok(Json(CancelResponse {
                job_id: id,
                message: "cancellation requested; the pipeline child will be killed".to_string(),
            }))
        }
        None => Ok(Json(CancelResponse {
            job_id: id,
            message: "Job is not running".to_string(),
        })),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut available_ad_csvs = BTreeMap::new();
    available_ad_csvs.insert("input".to_string(), scan_csvs(&state.config.input_dir));
    Json(HealthResponse {
        hostname: env::hostname(),
        active_jobs: state.store.active_count(),
        available_ad_csvs,
    })
}

/// Sorted `*.csv` file names in a directory; empty when it does not exist.
pub(crate) fn scan_csvs(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.ends_with(".csv"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
