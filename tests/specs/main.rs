// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace specs: batch execution behavior driven through the public
//! crate APIs, end to end.

mod prelude;

mod pipeline {
    mod execution;
    mod resume;
}
