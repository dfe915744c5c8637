// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("cannot resolve a state directory (no BR_STATE_DIR, XDG_STATE_HOME, or HOME)")]
    NoStateDir,
    #[error("invalid BRD_ADDR: {0}")]
    InvalidAddr(String),
}

/// Resolve state directory: BR_STATE_DIR > XDG_STATE_HOME/batchrun > ~/.local/state/batchrun
pub fn state_dir() -> Result<PathBuf, EnvError> {
    if let Ok(dir) = std::env::var("BR_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("batchrun"));
    }
    let home = std::env::var("HOME").map_err(|_| EnvError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/batchrun"))
}

/// Listen address (default loopback).
pub fn bind_addr() -> Result<SocketAddr, EnvError> {
    match std::env::var("BRD_ADDR") {
        Ok(addr) => addr.parse().map_err(|_| EnvError::InvalidAddr(addr)),
        Err(_) => Ok(SocketAddr::from(([127, 0, 0, 1], 7800))),
    }
}

/// Pipeline binary the supervisor spawns (default: `br` from PATH).
pub fn pipeline_bin() -> PathBuf {
    std::env::var("BRD_PIPELINE_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("br"))
}

/// Hostname for the health endpoint.
pub fn hostname() -> String {
    if let Ok(name) = std::fs::read_to_string("/etc/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}
