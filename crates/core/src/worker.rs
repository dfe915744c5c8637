// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one worker slot in a pool.
///
/// Workers are numbered from 1 in assignment order; worker 1 is the
/// primary that performs the interactive session bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// Create a WorkerId from a 1-based worker number.
    pub fn new(number: usize) -> Self {
        Self(number)
    }

    /// The 1-based worker number.
    pub fn number(&self) -> usize {
        self.0
    }

    /// True for the first worker by assignment order.
    pub fn is_primary(&self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl From<usize> for WorkerId {
    fn from(n: usize) -> Self {
        Self(n)
    }
}
