// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable elapsed-time formatting for summaries and logs.

/// Format elapsed milliseconds for display.
///
/// Sub-second durations render as milliseconds, sub-minute as fractional
/// seconds, and anything longer as minutes and whole seconds.
pub fn format_elapsed_ms(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    let secs = ms as f64 / 1_000.0;
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let minutes = ms / 60_000;
    let rem_secs = (ms % 60_000) / 1_000;
    if minutes < 60 {
        return format!("{minutes}m {rem_secs}s");
    }
    let hours = minutes / 60;
    let rem_minutes = minutes % 60;
    format!("{hours}h {rem_minutes}m")
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
