//! Revert to the baseline.

use crate::workspace::open_workspace;
use anyhow::{Context, Result};
use kbdelta_core::UndoOutcome;
use std::path::Path;

pub async fn undo(config_path: &Path, dry_run: bool) -> Result<()> {
    let mut ws = open_workspace(config_path).await?;

    if dry_run {
        let changes = ws.session.changes();
        println!("{}", serde_json::to_string_pretty(&changes)?);
        eprintln!("(dry run: {} change(s) would be discarded)", changes.len());
        return Ok(());
    }

    match ws.session.undo().await.context("Failed to undo changes")? {
        UndoOutcome::NothingToUndo => println!("No changes to undo"),
        UndoOutcome::Reverted { entries } => {
            println!("↩️  Reverted {} change(s); knowledge base is back to baseline", entries)
        }
    }
    Ok(())
}
