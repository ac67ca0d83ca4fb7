//! Import of an external change set.

use crate::workspace::{commit, open_workspace};
use anyhow::{Context, Result};
use kbdelta_core::ChangeSet;
use std::fs;
use std::path::Path;

pub async fn apply_file(config_path: &Path, file: &Path, dry_run: bool) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let changes: ChangeSet = serde_json::from_str(&text)
        .with_context(|| format!("{:?} is not a change set", file))?;

    let mut ws = open_workspace(config_path).await?;
    ws.session.apply_changes(&changes);
    println!(
        "📥 Applied {} modification(s) and {} note change(s)",
        changes.modifications.len(),
        changes.notes.len()
    );
    commit(&ws.session, dry_run).await
}
