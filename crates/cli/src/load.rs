// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary loader: campaign CSV to Batch.
//!
//! The input format follows the original campaign sheets: one row per
//! campaign group with `group`, `enabled` and `variants` columns, plus an
//! optional `csv_file` pointing at the ad creative sheet. Any other column
//! is carried opaquely into the item's settings. Validation happens here,
//! at the edge; the engine never sees a malformed batch.

use br_core::batch::{Batch, Subtask, WorkItem};
use std::path::Path;

/// Device variants a row may name.
const VALID_VARIANTS: &[&str] = &["desktop", "ios", "android", "all mobile"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("input has no header row")]
    EmptyInput,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
}

pub fn load_batch(path: &Path) -> Result<Batch, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_batch(&content, &path.display().to_string())
}

/// Parse CSV text into a batch. Row numbers in errors are 1-based data
/// rows, header excluded.
pub fn parse_batch(content: &str, input_file: &str) -> Result<Batch, LoadError> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let header = lines.next().ok_or(LoadError::EmptyInput)?;
    let columns: Vec<String> = split_csv_line(header)
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();

    let group_idx = column_index(&columns, "group")?;
    let enabled_idx = column_index(&columns, "enabled")?;
    let variants_idx = column_index(&columns, "variants")?;
    let csv_file_idx = columns.iter().position(|c| c == "csv_file");

    let mut items: Vec<WorkItem> = Vec::new();
    for (row, line) in lines.enumerate() {
        let row = row + 1;
        let fields = split_csv_line(line);
        let field = |idx: usize| fields.get(idx).map(|f| f.trim()).unwrap_or("");

        let group = field(group_idx).to_string();
        if group.is_empty() {
            return Err(LoadError::Row { row, message: "empty group name".to_string() });
        }
        if items.iter().any(|i| i.group == group) {
            return Err(LoadError::Row {
                row,
                message: format!("duplicate group '{group}'"),
            });
        }

        let enabled = parse_enabled(field(enabled_idx)).ok_or_else(|| LoadError::Row {
            row,
            message: format!("invalid enabled value '{}'", field(enabled_idx)),
        })?;

        let subtasks = expand_variants(field(variants_idx))
            .map_err(|message| LoadError::Row { row, message })?;

        let mut settings = serde_json::Map::new();
        for (idx, column) in columns.iter().enumerate() {
            if idx == group_idx || idx == enabled_idx || idx == variants_idx {
                continue;
            }
            if Some(idx) == csv_file_idx {
                continue;
            }
            let value = field(idx);
            if !value.is_empty() {
                settings.insert(column.clone(), serde_json::Value::String(value.to_string()));
            }
        }

        let mut item = WorkItem::new(group, subtasks);
        item.enabled = enabled;
        item.source_ref = csv_file_idx
            .map(|idx| field(idx))
            .filter(|f| !f.is_empty())
            .map(String::from);
        if !settings.is_empty() {
            item.settings = serde_json::Value::Object(settings);
        }
        items.push(item);
    }

    Ok(Batch::new(input_file, items))
}

fn column_index(columns: &[String], name: &'static str) -> Result<usize, LoadError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or(LoadError::MissingColumn(name))
}

fn parse_enabled(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Expand a comma-separated variants field into ordered subtasks.
///
/// `android` depends on the `ios` campaign id. `all mobile` collapses to a
/// single combined ios subtask covering both platforms; separate `ios` and
/// `android` entries on the same row are then redundant and dropped.
fn expand_variants(field: &str) -> Result<Vec<Subtask>, String> {
    let variants: Vec<String> = field
        .split(',')
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    if variants.is_empty() {
        return Err("no variants specified".to_string());
    }
    for variant in &variants {
        if !VALID_VARIANTS.contains(&variant.as_str()) {
            return Err(format!(
                "invalid variant '{variant}' (expected desktop, ios, android, or all mobile)"
            ));
        }
    }

    let combined = variants.iter().any(|v| v == "all mobile");
    fn push_once(subtask: Subtask, subtasks: &mut Vec<Subtask>) {
        if !subtasks.iter().any(|s| s.tag == subtask.tag) {
            subtasks.push(subtask);
        }
    }

    let mut subtasks: Vec<Subtask> = Vec::new();

    for variant in &variants {
        match variant.as_str() {
            "desktop" => push_once(Subtask::new("desktop", "create_campaign"), &mut subtasks),
            "all mobile" => push_once(
                Subtask::new("ios", "create_campaign")
                    .params(serde_json::json!({ "combined_mobile": true })),
                &mut subtasks,
            ),
            "ios" if combined => {}
            "ios" => push_once(Subtask::new("ios", "create_campaign"), &mut subtasks),
            "android" if combined => {}
            "android" => push_once(
                Subtask::new("android", "create_campaign").requires("ios"),
                &mut subtasks,
            ),
            _ => {}
        }
    }
    Ok(subtasks)
}

/// Minimal CSV field splitter with double-quote support.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
