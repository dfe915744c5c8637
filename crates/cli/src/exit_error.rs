// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries the process exit code.
//!
//! Command handlers return this through `anyhow::Result` instead of
//! calling `std::process::exit()` themselves; `main()` downcasts it and
//! terminates with the requested code.

#[derive(Debug, thiserror::Error)]
#[error("{}", message.as_deref().unwrap_or_default())]
pub struct ExitError {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Exit with a code but nothing on stderr (the command already
    /// printed its own summary).
    pub fn silent(code: i32) -> Self {
        Self { code, message: None }
    }
}
