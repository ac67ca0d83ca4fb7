//! Read-only browsing of the working tree.

use crate::envelope::{self, FieldData};
use crate::workspace::open_workspace;
use anyhow::Result;
use std::path::Path;

pub async fn list_sections(config_path: &Path, json: bool) -> Result<()> {
    let ws = open_workspace(config_path).await?;
    let sections = ws.session.sections();

    if json {
        let payload = envelope::envelope("sections", &sections);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if sections.is_empty() {
        println!("Knowledge base has no sections");
        return Ok(());
    }
    for section in sections {
        match ws.session.general_note(section) {
            Some(note) => println!("📁 {}  ({})", section, note),
            None => println!("📁 {}", section),
        }
    }
    Ok(())
}

pub async fn show_path(config_path: &Path, path: &str, json: bool) -> Result<()> {
    let ws = open_workspace(config_path).await?;
    let value = ws.session.get(path).cloned();
    let notes = ws.session.notes(path);

    if json {
        let payload = envelope::envelope(
            "field",
            FieldData {
                path: path.to_string(),
                value,
                notes,
            },
        );
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let Some(value) = value else {
        anyhow::bail!("Nothing at path '{}'", path);
    };
    match &value {
        serde_json::Value::String(s) => println!("{}", s),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    for (i, note) in notes.iter().enumerate() {
        println!("  📝 [{}] {}", i, note);
    }
    Ok(())
}
