// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint command handlers

use crate::env;
use crate::exit_error::ExitError;
use anyhow::Result;
use br_core::batch::SessionId;
use br_storage::CheckpointStore;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct CheckpointsArgs {
    #[command(subcommand)]
    pub command: CheckpointsCommand,
}

#[derive(Subcommand)]
pub enum CheckpointsCommand {
    /// List saved sessions, newest first
    List,
    /// Print one session's snapshot as JSON
    Show {
        /// Session id (ses-...)
        session: String,
    },
    /// Delete a session's snapshot
    Delete {
        /// Session id (ses-...)
        session: String,
    },
}

pub fn handle(command: CheckpointsCommand) -> Result<()> {
    let store = CheckpointStore::new(&env::state_dir()?);
    match command {
        CheckpointsCommand::List => {
            let summaries = store.list()?;
            if summaries.is_empty() {
                println!("No checkpoints");
                return Ok(());
            }
            for summary in summaries {
                println!(
                    "{}  {}/{} done  updated {}  ({})",
                    summary.session_id,
                    summary.completed_subtasks,
                    summary.total_subtasks,
                    summary.last_updated,
                    summary.input_file,
                );
            }
        }
        CheckpointsCommand::Show { session } => {
            let id = SessionId::from_string(session.as_str());
            let record = store.load(&id)?.ok_or_else(|| {
                ExitError::new(1, format!("no checkpoint found for session '{session}'"))
            })?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        CheckpointsCommand::Delete { session } => {
            let id = SessionId::from_string(session.as_str());
            if !store.delete(&id)? {
                return Err(ExitError::new(
                    1,
                    format!("no checkpoint found for session '{session}'"),
                )
                .into());
            }
            println!("Deleted checkpoint {session}");
        }
    }
    Ok(())
}
