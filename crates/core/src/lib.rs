// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! br-core: Core data model for the batchrun pipeline

pub mod macros;

pub mod batch;
pub mod clock;
pub mod id;
pub mod job;
pub mod report;
pub mod result;
pub mod time_fmt;
pub mod worker;

pub use batch::{Batch, SessionId, Subtask, SubtaskState, WorkItem};
pub use clock::{Clock, FakeClock, SystemClock};
pub use job::{JobId, JobRecord, JobStatus, LOG_TAIL_LINES};
pub use report::RunReport;
pub use result::{TaskResult, TaskStatus};
#[cfg(any(test, feature = "test-support"))]
pub use result::TaskResultBuilder;
pub use time_fmt::format_elapsed_ms;
pub use worker::WorkerId;
