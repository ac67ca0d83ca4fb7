//! Change summary against the baseline.

use crate::envelope::{self, load_label, StatusData};
use crate::workspace::open_workspace;
use anyhow::Result;
use kbdelta_core::{ChangeStore, LoadOutcome};
use std::path::Path;

pub async fn status(config_path: &Path, json: bool) -> Result<()> {
    let ws = open_workspace(config_path).await?;
    let changes = ws.session.changes();

    if json {
        let payload = envelope::envelope(
            "status",
            StatusData {
                document: ws.config.document.clone(),
                store: ws.session.store().describe(),
                key_encoding: ws.session.key_encoding().as_str(),
                load: load_label(&ws.outcome),
                modifications: changes.modifications.len(),
                notes: changes.notes.len(),
                changes,
            },
        );
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Document: {}", ws.config.document);
    println!(
        "Store:    {} (keys: {})",
        ws.session.store().describe(),
        ws.session.key_encoding().as_str()
    );
    if let LoadOutcome::FellBack { reason } = &ws.outcome {
        println!("⚠️  Saved changes could not be loaded: {}", reason);
    }

    if changes.is_empty() {
        println!("\n✅ No changes against the baseline");
        return Ok(());
    }

    println!("\nModifications ({}):", changes.modifications.len());
    for (path, value) in &changes.modifications {
        println!("- {} = {}", path, value);
    }
    println!("\nNotes ({}):", changes.notes.len());
    for (path, value) in &changes.notes {
        if value.is_null() {
            println!("- {} (removed)", path);
        } else {
            println!("- {} = {}", path, value);
        }
    }
    Ok(())
}
