//! Export of the changed fragment.

use crate::workspace::open_workspace;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub async fn export_changes(config_path: &Path, output: Option<&Path>, stdout: bool) -> Result<()> {
    let ws = open_workspace(config_path).await?;

    let Some(fragment) = ws.session.export() else {
        println!("No changes to export");
        return Ok(());
    };

    let json = if ws.config.export.pretty {
        serde_json::to_string_pretty(&fragment)?
    } else {
        serde_json::to_string(&fragment)?
    };

    if stdout {
        println!("{json}");
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ws.config.export_path());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;

    println!("📤 Exported changes to {}", path.display());
    Ok(())
}
