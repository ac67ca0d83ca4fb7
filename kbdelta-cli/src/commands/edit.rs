//! Value edits.

use crate::workspace::{commit, open_workspace};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

pub async fn set_value(
    config_path: &Path,
    path: &str,
    raw: &str,
    parse_json: bool,
    dry_run: bool,
) -> Result<()> {
    let value = if parse_json {
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON value: {}", raw))?
    } else {
        Value::String(raw.to_string())
    };

    let mut ws = open_workspace(config_path).await?;
    let changed = ws
        .session
        .apply_edit(path, value)
        .with_context(|| format!("Failed to set '{}'", path))?;

    if changed {
        println!("✏️  Updated {}", path);
    } else {
        println!("{} already has that value", path);
    }
    commit(&ws.session, dry_run).await
}
