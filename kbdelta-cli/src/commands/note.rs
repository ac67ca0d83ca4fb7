//! Field notes and section general notes.

use crate::envelope::{self, NotesData};
use crate::workspace::{commit, open_workspace};
use crate::{GeneralNoteCommands, NoteCommands};
use anyhow::{Context, Result};
use std::path::Path;

pub async fn note(config_path: &Path, command: NoteCommands, dry_run: bool) -> Result<()> {
    let mut ws = open_workspace(config_path).await?;
    let session = &mut ws.session;

    match command {
        NoteCommands::List { path, json } => {
            let notes = session.notes(&path);
            if json {
                let payload = envelope::envelope("notes", NotesData { path, notes });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if notes.is_empty() {
                println!("No notes on {}", path);
            } else {
                for (i, note) in notes.iter().enumerate() {
                    println!("📝 [{}] {}", i, note);
                }
            }
            return Ok(());
        }
        NoteCommands::Add { path, text } => {
            let index = session
                .add_note(&path, &text)
                .with_context(|| format!("Failed to add note to '{}'", path))?;
            println!("📝 Added note [{}] to {}", index, path);
        }
        NoteCommands::Edit { path, index, text } => {
            session
                .edit_note(&path, index, &text)
                .with_context(|| format!("Failed to edit note [{}] on '{}'", index, path))?;
            println!("📝 Updated note [{}] on {}", index, path);
        }
        NoteCommands::Rm { path, index } => {
            let removed = session
                .delete_note(&path, index)
                .with_context(|| format!("Failed to delete note [{}] on '{}'", index, path))?;
            println!("🗑️  Deleted note [{}] on {}: {}", index, path, removed);
        }
    }

    commit(&ws.session, dry_run).await
}

pub async fn general_note(
    config_path: &Path,
    command: GeneralNoteCommands,
    dry_run: bool,
) -> Result<()> {
    let mut ws = open_workspace(config_path).await?;
    let session = &mut ws.session;

    match command {
        GeneralNoteCommands::Show { section } => {
            match session.general_note(&section) {
                Some(note) => println!("{}", note),
                None => println!("No general note on {}", section),
            }
            return Ok(());
        }
        GeneralNoteCommands::Set { section, text } => {
            let present = session
                .set_general_note(&section, &text)
                .with_context(|| format!("Failed to set general note on '{}'", section))?;
            if present {
                println!("📝 General note set on {}", section);
            } else {
                println!("🗑️  General note cleared on {}", section);
            }
        }
        GeneralNoteCommands::Clear { section } => {
            if session.clear_general_note(&section) {
                println!("🗑️  General note cleared on {}", section);
            } else {
                println!("No general note on {}", section);
            }
        }
    }

    commit(&ws.session, dry_run).await
}
