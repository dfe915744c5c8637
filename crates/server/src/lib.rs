// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! br-server: Single-flight HTTP job server
//!
//! Accepts a batch CSV over REST, runs the pipeline binary as a supervised
//! child process, and exposes live progress scraped from the child's
//! output. One job at a time; concurrent submissions are turned away with
//! 429 rather than queued.

pub mod env;
pub mod protocol;
pub mod routes;
pub mod runner;
pub mod store;

pub use routes::{router, AppState, ServerConfig};
pub use store::{JobStore, MemoryJobStore};
